//! Built-in tool implementations for aiagent.
//!
//! Tools give the agent the ability to reach outside the model:
//! search the web, query a knowledge base, generate images, or call any
//! HTTP endpoint declared in a YAML tool catalog.
//!
//! All built-ins share one [`Services`] value, built once at startup.

pub mod catalog;
pub mod http_endpoint;
pub mod image_generation;
pub mod knowledge_base;
pub mod retry;
pub mod services;
pub mod web_search;

use std::sync::Arc;

use aiagent_config::AppConfig;
use aiagent_core::error::ToolError;
use aiagent_core::tool::ToolRegistry;

pub use catalog::CatalogError;
pub use retry::{RetryError, RetryPolicy};
pub use services::Services;

/// Create a registry with every built-in tool.
pub fn builtin_registry(services: Arc<Services>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for builtin in [
        catalog::Builtin::WebSearch,
        catalog::Builtin::KnowledgeBase,
        catalog::Builtin::ImageGeneration,
    ] {
        // Built-in names are distinct, so registration cannot collide
        let _ = registry.register(builtin.build(services.clone()));
    }
    registry
}

/// Build the tool registry for `config`: the configured YAML catalog if
/// there is one, otherwise the built-ins.
pub fn load_registry(config: &AppConfig) -> Result<ToolRegistry, CatalogError> {
    let services = Arc::new(Services::new(&config.services)?);
    match &config.agent.tool_catalog {
        Some(path) => catalog::load(path, services),
        None => {
            tracing::info!("No tool catalog configured, using built-in tools");
            Ok(builtin_registry(services))
        }
    }
}

/// Fetch a required string argument.
pub(crate) fn required_str<'a>(
    arguments: &'a serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> Result<&'a str, ToolError> {
    arguments
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{key}' argument")))
}
