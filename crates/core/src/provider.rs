//! Provider trait — the abstraction over LLM backends.
//!
//! The agent talks to the model through a plain text-completion contract:
//! a fully rendered prompt goes in, generated text comes out, either as one
//! string or as a stream of text chunks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;

/// Sampling parameters forwarded to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    /// Maximum tokens to generate
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,

    /// Temperature (near 0.0 = deterministic)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_repetition_penalty")]
    pub repetition_penalty: f32,
}

fn default_max_new_tokens() -> u32 {
    4096
}
fn default_temperature() -> f32 {
    0.001
}
fn default_top_k() -> u32 {
    10
}
fn default_top_p() -> f32 {
    0.95
}
fn default_repetition_penalty() -> f32 {
    1.03
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            max_new_tokens: default_max_new_tokens(),
            temperature: default_temperature(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            repetition_penalty: default_repetition_penalty(),
        }
    }
}

impl SamplingParams {
    /// Same parameters with a different generation budget.
    pub fn with_max_new_tokens(mut self, max_new_tokens: u32) -> Self {
        self.max_new_tokens = max_new_tokens;
        self
    }
}

/// The core Provider trait.
///
/// Every model backend implements this trait. The agent loop calls
/// `complete()` or `stream()` without knowing which backend is being used.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "tgi").
    fn name(&self) -> &str;

    /// Send a prompt and get the complete generated text.
    async fn complete(
        &self,
        prompt: &str,
        params: &SamplingParams,
    ) -> std::result::Result<String, ProviderError>;

    /// Send a prompt and get a stream of generated text chunks.
    ///
    /// Default implementation calls `complete()` and yields the result as a single chunk.
    async fn stream(
        &self,
        prompt: &str,
        params: &SamplingParams,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<String, ProviderError>>,
        ProviderError,
    > {
        let text = self.complete(prompt, params).await?;
        let (tx, rx) = tokio::sync::mpsc::channel(1);
        let _ = tx.send(Ok(text)).await;
        Ok(rx)
    }

    /// Health check — can we reach the backend?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoProvider;

    #[async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            prompt: &str,
            _params: &SamplingParams,
        ) -> std::result::Result<String, ProviderError> {
            Ok(prompt.to_uppercase())
        }
    }

    #[test]
    fn sampling_defaults() {
        let params = SamplingParams::default();
        assert_eq!(params.max_new_tokens, 4096);
        assert_eq!(params.top_k, 10);
        assert!((params.top_p - 0.95).abs() < f32::EPSILON);
        assert!((params.repetition_penalty - 1.03).abs() < f32::EPSILON);
    }

    #[test]
    fn sampling_params_fill_missing_fields() {
        let params: SamplingParams = serde_json::from_str(r#"{"temperature": 0.5}"#).unwrap();
        assert!((params.temperature - 0.5).abs() < f32::EPSILON);
        assert_eq!(params.max_new_tokens, 4096);
    }

    #[tokio::test]
    async fn default_stream_yields_single_chunk() {
        let provider = EchoProvider;
        let mut rx = provider
            .stream("hello", &SamplingParams::default())
            .await
            .unwrap();
        assert_eq!(rx.recv().await.unwrap().unwrap(), "HELLO");
        assert!(rx.recv().await.is_none());
    }
}
