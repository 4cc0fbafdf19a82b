//! `aiagent config` — Configuration management commands.

use std::path::Path;

use aiagent_config::AppConfig;

pub async fn validate(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating configuration...");

    let config = match super::load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            println!("   Config error: {e}");
            return Err(e);
        }
    };
    println!("   Config parsed successfully");

    let warnings = warnings(&config);
    if warnings.is_empty() {
        println!("   All checks passed");
    } else {
        println!();
        for w in &warnings {
            println!("   warning: {w}");
        }
    }

    println!();
    println!("   Model:     {} @ {}", config.llm.model, config.llm.endpoint_url);
    println!("   Language:  {}", config.agent.language);
    println!("   Steps:     {}", config.agent.recursion_limit);
    println!("   Gateway:   {}:{}", config.gateway.host, config.gateway.port);
    match &config.agent.tool_catalog {
        Some(path) => println!("   Catalog:   {}", path.display()),
        None => println!("   Catalog:   built-in tools"),
    }

    Ok(())
}

/// Settings that load fine but will make tools fail at call time.
fn warnings(config: &AppConfig) -> Vec<&'static str> {
    let services = &config.services;
    let mut warnings = Vec::new();

    if services.tei_embedding_endpoint.is_none() {
        warnings.push("No embedding endpoint: web_search and search_knowledge_base will fail");
    }
    if services.web_retriever_endpoint.is_none() {
        warnings.push("No web retriever endpoint: web_search will fail");
    }
    if services.retrieval_endpoint.is_none() || services.tei_reranking_endpoint.is_none() {
        warnings.push("Retrieval or reranking endpoint missing: search_knowledge_base will fail");
    }
    if services.image_gen_endpoint.is_none() {
        warnings.push("No image generation endpoint: image_generation will fail");
    }

    warnings
}

pub async fn show(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => println!("{}", path.display()),
        None => println!("{}", AppConfig::config_dir().join("config.toml").display()),
    }
    Ok(())
}

pub async fn default() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", AppConfig::default_toml());
    Ok(())
}
