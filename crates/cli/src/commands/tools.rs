//! `aiagent tools` — List the tools the agent can call.

use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let registry = aiagent_tools::load_registry(&config)?;

    match &config.agent.tool_catalog {
        Some(path) => println!("Tools from {} ({}):", path.display(), registry.len()),
        None => println!("Built-in tools ({}):", registry.len()),
    }
    println!();
    println!("{}", registry.describe_all());

    Ok(())
}
