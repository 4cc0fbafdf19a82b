//! Text-generation-inference provider implementation.
//!
//! Talks to a Hugging Face TGI server (or anything exposing the same
//! `/generate` and `/generate_stream` routes).
//!
//! Supports:
//! - Plain completions (`POST /generate`)
//! - Token streaming over SSE (`POST /generate_stream`)
//! - Health checks (`GET /health`)

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use aiagent_core::error::ProviderError;
use aiagent_core::provider::{Provider, SamplingParams};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// A TGI-backed LLM provider.
pub struct TgiProvider {
    name: String,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl TgiProvider {
    /// Create a new TGI provider with the given request timeout.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: "tgi".into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            timeout,
            client,
        })
    }

    fn request_body(prompt: &str, params: &SamplingParams) -> GenerateRequest {
        GenerateRequest {
            inputs: prompt.to_string(),
            parameters: GenerateParameters {
                max_new_tokens: params.max_new_tokens,
                temperature: params.temperature,
                top_k: params.top_k,
                top_p: params.top_p,
                repetition_penalty: params.repetition_penalty,
                return_full_text: false,
            },
        }
    }

    async fn post(
        &self,
        path: &str,
        body: &GenerateRequest,
    ) -> Result<reqwest::Response, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(format!(
                    "no response from {url} within {}s",
                    self.timeout.as_secs()
                ))
            } else {
                ProviderError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl Provider for TgiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<String, ProviderError> {
        debug!(
            provider = %self.name,
            prompt_chars = prompt.len(),
            max_new_tokens = params.max_new_tokens,
            "Sending generate request"
        );

        let response = self
            .post("/generate", &Self::request_body(prompt, params))
            .await?;

        let body: GenerateResponse = response.json().await.map_err(|e| ProviderError::ApiError {
            status_code: 200,
            message: format!("Failed to parse response: {e}"),
        })?;

        Ok(body.generated_text)
    }

    async fn stream(
        &self,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<tokio::sync::mpsc::Receiver<Result<String, ProviderError>>, ProviderError> {
        debug!(provider = %self.name, "Sending streaming generate request");

        let response = self
            .post("/generate_stream", &Self::request_body(prompt, params))
            .await?;

        let (tx, rx) = tokio::sync::mpsc::channel(64);
        let provider_name = self.name.clone();

        // Spawn task to read the SSE byte stream and forward token text
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            // Raw bytes: a UTF-8 character may straddle two network chunks
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                buffer.extend_from_slice(&bytes);

                // Process complete lines
                while let Some(line_end) = buffer.iter().position(|&b| b == b'\n') {
                    let line = String::from_utf8_lossy(&buffer[..line_end])
                        .trim_end_matches('\r')
                        .to_string();
                    buffer.drain(..=line_end);

                    match parse_sse_line(&line) {
                        SseFrame::Token(text) => {
                            if tx.send(Ok(text)).await.is_err() {
                                return; // receiver dropped
                            }
                        }
                        SseFrame::Error(message) => {
                            let _ = tx.send(Err(ProviderError::StreamInterrupted(message))).await;
                            return;
                        }
                        SseFrame::Done => return,
                        SseFrame::Skip => {}
                        SseFrame::Invalid(reason) => {
                            trace!(provider = %provider_name, error = %reason, "Ignoring unparseable SSE chunk");
                        }
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

/// One decoded line of the TGI event stream.
#[derive(Debug, PartialEq)]
enum SseFrame {
    Token(String),
    Error(String),
    Done,
    Skip,
    Invalid(String),
}

fn parse_sse_line(line: &str) -> SseFrame {
    // Skip empty lines, SSE comments and non-data fields
    let Some(data) = line.strip_prefix("data:") else {
        return SseFrame::Skip;
    };
    let data = data.trim();

    if data == "[DONE]" {
        return SseFrame::Done;
    }

    match serde_json::from_str::<StreamEvent>(data) {
        Ok(StreamEvent {
            error: Some(error), ..
        }) => SseFrame::Error(error),
        Ok(StreamEvent {
            token: Some(token), ..
        }) if !token.special => SseFrame::Token(token.text),
        Ok(_) => SseFrame::Skip,
        Err(e) => SseFrame::Invalid(e.to_string()),
    }
}

// --- TGI API types (internal) ---

#[derive(Debug, Serialize)]
struct GenerateRequest {
    inputs: String,
    parameters: GenerateParameters,
}

#[derive(Debug, Serialize)]
struct GenerateParameters {
    max_new_tokens: u32,
    temperature: f32,
    top_k: u32,
    top_p: f32,
    repetition_penalty: f32,
    return_full_text: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
struct StreamEvent {
    #[serde(default)]
    token: Option<StreamToken>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamToken {
    text: String,
    #[serde(default)]
    special: bool,
}
