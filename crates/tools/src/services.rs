//! HTTP clients for the downstream microservices the built-in tools use.
//!
//! One `Services` value is built at startup from `ServicesConfig` and shared
//! by every tool behind an `Arc`. It owns a single pooled `reqwest::Client`
//! and the retry policy, so no tool ever builds its own connection.

use std::time::Duration;

use aiagent_config::ServicesConfig;
use aiagent_core::error::ToolError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::retry::RetryPolicy;

/// Documents handed to the reranker and knowledge-base answer.
pub const RERANK_TOP_K: usize = 5;

/// Number of web documents requested per search.
const WEB_RETRIEVAL_K: u32 = 8;

/// Shared clients for embedding, retrieval, reranking and image generation.
pub struct Services {
    client: reqwest::Client,
    retry: RetryPolicy,
    embedding: Option<String>,
    web_retriever: Option<String>,
    retrieval: Option<String>,
    reranking: Option<String>,
    image_gen: Option<String>,
}

impl Services {
    pub fn new(config: &ServicesConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            retry: RetryPolicy::from_config(config),
            embedding: trimmed(&config.tei_embedding_endpoint),
            web_retriever: trimmed(&config.web_retriever_endpoint),
            retrieval: trimmed(&config.retrieval_endpoint),
            reranking: trimmed(&config.tei_reranking_endpoint),
            image_gen: trimmed(&config.image_gen_endpoint),
        })
    }

    /// The pooled client, for tools that call endpoints of their own.
    pub fn http_client(&self) -> reqwest::Client {
        self.client.clone()
    }

    /// Embed `text` with the TEI embedding service.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, ToolError> {
        let base = endpoint(&self.embedding, "embedding")?;
        let body = serde_json::json!({ "inputs": text });
        let vectors: Vec<Vec<f32>> = self
            .post_json("embedding", &format!("{base}/embed"), &body)
            .await?;

        vectors.into_iter().next().ok_or_else(|| ToolError::ExecutionFailed {
            tool_name: "embedding".into(),
            reason: "service returned no vectors".into(),
        })
    }

    /// Search the web for documents similar to `text`.
    pub async fn web_retrieve(&self, text: &str, embedding: &[f32]) -> Result<Vec<RetrievedDoc>, ToolError> {
        let base = endpoint(&self.web_retriever, "web_retriever")?;
        let body = serde_json::json!({
            "text": text,
            "embedding": embedding,
            "k": WEB_RETRIEVAL_K,
        });
        let response: RetrievalResponse = self
            .post_json("web_retriever", &format!("{base}/v1/web_retrieval"), &body)
            .await?;
        Ok(response.retrieved_docs)
    }

    /// Query the knowledge-base vector store.
    pub async fn retrieve(&self, text: &str, embedding: &[f32]) -> Result<Vec<RetrievedDoc>, ToolError> {
        let url = endpoint(&self.retrieval, "retrieval")?;
        let body = RetrievalRequest {
            text,
            embedding,
            search_type: "similarity",
            k: 10,
            fetch_k: 20,
            lambda_mult: 0.5,
        };
        let response: RetrievalResponse = self.post_json("retrieval", url, &body).await?;
        Ok(response.retrieved_docs)
    }

    /// Rerank `texts` against `query`, returning the best `RERANK_TOP_K`
    /// texts by descending score.
    pub async fn rerank(&self, query: &str, texts: &[String]) -> Result<Vec<String>, ToolError> {
        let base = endpoint(&self.reranking, "reranking")?;
        let body = serde_json::json!({ "query": query, "texts": texts });
        let scores: Vec<RerankScore> = self
            .post_json("reranking", &format!("{base}/rerank"), &body)
            .await?;
        Ok(top_by_score(scores, texts, RERANK_TOP_K))
    }

    /// Generate one image for `prompt` and return its URL.
    pub async fn text_to_image(&self, prompt: &str) -> Result<String, ToolError> {
        let base = endpoint(&self.image_gen, "image_gen")?;
        let body = serde_json::json!({ "prompt": prompt, "num_images_per_prompt": 1 });
        let response: ImageResponse = self
            .post_json("image_gen", &format!("{base}/v1/text2image"), &body)
            .await?;

        response
            .images
            .into_iter()
            .next()
            .ok_or_else(|| ToolError::ExecutionFailed {
                tool_name: "image_generation".into(),
                reason: "service returned no images".into(),
            })
    }

    async fn post_json<B, R>(&self, service: &str, url: &str, body: &B) -> Result<R, ToolError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!(service, url, "Calling downstream service");
        self.retry
            .run(service, || async {
                let response = self
                    .client
                    .post(url)
                    .json(body)
                    .send()
                    .await
                    .map_err(|e| e.to_string())?;

                let status = response.status();
                if !status.is_success() {
                    let text = response.text().await.unwrap_or_default();
                    return Err(format!("HTTP {}: {}", status.as_u16(), text));
                }
                let parsed = response
                    .json::<R>()
                    .await
                    .map_err(|e| format!("invalid response body: {e}"))?;
                Ok::<R, String>(parsed)
            })
            .await
            .map_err(|e| ToolError::RetriesExhausted {
                service: service.to_string(),
                attempts: e.attempts,
                last_error: e.last_error,
            })
    }
}

/// A retrieved document; only the text is used.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievedDoc {
    pub text: String,
}

#[derive(Debug, Serialize)]
struct RetrievalRequest<'a> {
    text: &'a str,
    embedding: &'a [f32],
    search_type: &'static str,
    k: u32,
    fetch_k: u32,
    lambda_mult: f32,
}

#[derive(Debug, Deserialize)]
struct RetrievalResponse {
    #[serde(default)]
    retrieved_docs: Vec<RetrievedDoc>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RerankScore {
    index: usize,
    score: f32,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    images: Vec<String>,
}

fn top_by_score(mut scores: Vec<RerankScore>, texts: &[String], k: usize) -> Vec<String> {
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));
    scores
        .into_iter()
        .filter_map(|s| texts.get(s.index).cloned())
        .take(k)
        .collect()
}

fn trimmed(endpoint: &Option<String>) -> Option<String> {
    endpoint
        .as_deref()
        .map(|url| url.trim_end_matches('/').to_string())
        .filter(|url| !url.is_empty())
}

fn endpoint<'a>(slot: &'a Option<String>, service: &str) -> Result<&'a str, ToolError> {
    slot.as_deref().ok_or_else(|| ToolError::ExecutionFailed {
        tool_name: service.to_string(),
        reason: format!("{service} endpoint is not configured"),
    })
}
