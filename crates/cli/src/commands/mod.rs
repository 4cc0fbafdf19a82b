pub mod agent;
pub mod config_cmd;
pub mod gateway;
pub mod plan;
pub mod tools;

use std::path::Path;

use aiagent_config::AppConfig;

/// Load the config from `path` if given, else from the default location.
/// Environment overrides apply either way.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    };
    config.map_err(|e| format!("Failed to load config: {e}").into())
}
