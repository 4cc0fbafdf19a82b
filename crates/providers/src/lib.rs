//! LLM Provider implementations for aiagent.
//!
//! All providers implement the `aiagent_core::Provider` trait.
//! `build_from_config` constructs the configured backend once at startup.

pub mod tgi;

pub use tgi::TgiProvider;

use std::sync::Arc;
use std::time::Duration;

use aiagent_core::Provider;
use aiagent_core::error::ProviderError;

/// Build the model provider from configuration.
pub fn build_from_config(
    config: &aiagent_config::AppConfig,
) -> Result<Arc<dyn Provider>, ProviderError> {
    let llm = &config.llm;
    tracing::info!(endpoint = %llm.endpoint_url, model = %llm.model, "Configuring TGI provider");

    let provider = TgiProvider::new(
        &llm.endpoint_url,
        llm.api_key.clone(),
        Duration::from_secs(llm.timeout_secs),
    )?;
    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_default_config() {
        let config = aiagent_config::AppConfig::default();
        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.name(), "tgi");
    }
}
