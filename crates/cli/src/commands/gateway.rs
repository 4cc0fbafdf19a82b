//! `aiagent serve` — Start the HTTP API server.

use std::path::Path;

pub async fn run(
    config_path: Option<&Path>,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("aiagent gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {} @ {}", config.llm.model, config.llm.endpoint_url);

    aiagent_gateway::start(config).await?;

    Ok(())
}
