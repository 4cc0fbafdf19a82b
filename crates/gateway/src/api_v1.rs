//! HTTP API v1 — the agent endpoints.
//!
//! Endpoints:
//!
//! - `POST /v1/agent/start`      — Break a goal into search queries
//! - `POST /v1/agent/execute`    — Run the ReAct loop, stream events over SSE
//! - `POST /v1/agent/run`        — Run the ReAct loop, return the final answer
//! - `POST /v1/agent/summarize`  — Summarize collected results (JSON or SSE)
//! - `GET  /v1/tools`            — List registered tools

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::sse::{Event as SseEvent, Sse},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use aiagent_agent::{AgentStreamEvent, ReactAgent, TaskPlanner};
use aiagent_core::provider::{Provider, SamplingParams};
use aiagent_core::tool::ToolDefinition;

// ── State ─────────────────────────────────────────────────────────────────

/// Shared state for the v1 API.
pub struct ApiV1State {
    pub agent: ReactAgent,
    pub planner: TaskPlanner,
    /// Base sampling parameters; requests may override individual fields.
    pub sampling: SamplingParams,
    /// Model backend checked by `/health`.
    pub provider: Arc<dyn Provider>,
}

pub type SharedApiState = Arc<ApiV1State>;

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedApiState) -> Router {
    Router::new()
        .route("/agent/start", post(start_handler))
        .route("/agent/execute", post(execute_handler))
        .route("/agent/run", post(run_handler))
        .route("/agent/summarize", post(summarize_handler))
        .route("/tools", get(list_tools_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

/// Per-request sampling overrides, flattened into the request body.
#[derive(Debug, Default, Deserialize)]
pub struct SamplingOverrides {
    pub max_new_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_k: Option<u32>,
    pub top_p: Option<f32>,
    pub repetition_penalty: Option<f32>,
}

impl SamplingOverrides {
    pub fn apply(&self, base: &SamplingParams) -> SamplingParams {
        SamplingParams {
            max_new_tokens: self.max_new_tokens.unwrap_or(base.max_new_tokens),
            temperature: self.temperature.unwrap_or(base.temperature),
            top_k: self.top_k.unwrap_or(base.top_k),
            top_p: self.top_p.unwrap_or(base.top_p),
            repetition_penalty: self.repetition_penalty.unwrap_or(base.repetition_penalty),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub query: String,
    #[serde(flatten)]
    pub sampling: SamplingOverrides,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunResponse {
    pub answer: String,
    pub outcome: String,
    pub steps: u32,
    pub tool_calls: usize,
}

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub goal: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub results: Vec<String>,
    #[serde(default)]
    pub streaming: bool,
    #[serde(flatten)]
    pub sampling: SamplingOverrides,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolListResponse {
    pub tools: Vec<ToolDefinition>,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

fn require_text(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("'{field}' must not be empty"),
        ));
    }
    Ok(())
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn start_handler(
    State(state): State<SharedApiState>,
    Json(payload): Json<StartRequest>,
) -> Result<Json<Vec<String>>, ApiError> {
    require_text("query", &payload.query)?;
    info!(query_chars = payload.query.len(), "v1/agent/start request");

    let params = payload.sampling.apply(&state.sampling);
    let tasks = state
        .planner
        .start(&payload.query, &params)
        .await
        .map_err(|e| {
            warn!(error = %e, "Task planning failed");
            api_error(StatusCode::BAD_GATEWAY, format!("Task planning failed: {e}"))
        })?;

    Ok(Json(tasks))
}

async fn execute_handler(
    State(state): State<SharedApiState>,
    Json(payload): Json<QueryRequest>,
) -> Result<Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    require_text("query", &payload.query)?;
    info!(query_chars = payload.query.len(), "v1/agent/execute SSE request");

    let rx = state.agent.run_stream(&payload.query);
    let stream = ReceiverStream::new(rx).map(|event: AgentStreamEvent| {
        Ok(SseEvent::default()
            .event(event.event_type())
            .data(event.to_sse_data()))
    });

    Ok(Sse::new(stream))
}

async fn run_handler(
    State(state): State<SharedApiState>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<RunResponse>, ApiError> {
    require_text("query", &payload.query)?;
    info!(query_chars = payload.query.len(), "v1/agent/run request");

    let result = state.agent.run(&payload.query).await;
    Ok(Json(RunResponse {
        answer: result.answer().to_string(),
        outcome: result.outcome.kind().to_string(),
        steps: result.steps,
        tool_calls: result.tool_calls_made(),
    }))
}

async fn summarize_handler(
    State(state): State<SharedApiState>,
    Json(payload): Json<SummarizeRequest>,
) -> Result<Response, ApiError> {
    require_text("goal", &payload.goal)?;
    info!(
        results = payload.results.len(),
        streaming = payload.streaming,
        "v1/agent/summarize request"
    );

    let params = payload.sampling.apply(&state.sampling);
    let language = payload.language.as_deref();
    let failed = |e: aiagent_core::error::ProviderError| {
        warn!(error = %e, "Summarization failed");
        api_error(StatusCode::BAD_GATEWAY, format!("Summarization failed: {e}"))
    };

    if !payload.streaming {
        let summary = state
            .planner
            .summarize(&payload.goal, language, &payload.results, &params)
            .await
            .map_err(failed)?;
        return Ok(Json(summary).into_response());
    }

    let rx = state
        .planner
        .summarize_stream(&payload.goal, language, &payload.results, &params)
        .await
        .map_err(failed)?;

    let chunks = ReceiverStream::new(rx).map(|chunk| {
        let data = match chunk {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Summary stream interrupted");
                format!("Error: {e}")
            }
        };
        Ok::<_, Infallible>(SseEvent::default().data(data))
    });
    let done = tokio_stream::once(Ok::<_, Infallible>(
        SseEvent::default().data(AgentStreamEvent::Done.to_sse_data()),
    ));

    Ok(Sse::new(chunks.chain(done)).into_response())
}

async fn list_tools_handler(State(state): State<SharedApiState>) -> Json<ToolListResponse> {
    let tools = state.agent.tools().definitions();
    let count = tools.len();
    Json(ToolListResponse { tools, count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::sync::Mutex;
    use tower::ServiceExt;

    use aiagent_core::error::{ProviderError, ToolError};
    use aiagent_core::tool::{ParamSpec, ParameterSchema, Tool, ToolRegistry};

    /// Lightweight mock provider for gateway tests: replays replies in order
    /// and repeats the last one once the script runs out.
    struct MockProvider {
        replies: Vec<Result<String, ProviderError>>,
        calls: Mutex<usize>,
    }

    impl MockProvider {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: replies.iter().map(|r| Ok(r.to_string())).collect(),
                calls: Mutex::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                replies: vec![Err(ProviderError::Network("connection refused".into()))],
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl Provider for MockProvider {
        fn name(&self) -> &str {
            "gateway_mock"
        }

        async fn complete(
            &self,
            _prompt: &str,
            _params: &SamplingParams,
        ) -> Result<String, ProviderError> {
            let mut calls = self.calls.lock().unwrap();
            let index = (*calls).min(self.replies.len() - 1);
            *calls += 1;
            match &self.replies[index] {
                Ok(text) => Ok(text.clone()),
                Err(_) => Err(ProviderError::Network("connection refused".into())),
            }
        }
    }

    struct LookupTool {
        params: ParameterSchema,
    }

    impl LookupTool {
        fn new() -> Self {
            let mut params = ParameterSchema::new();
            params.insert("query".into(), ParamSpec::new("str", "what to look up"));
            Self { params }
        }
    }

    #[async_trait::async_trait]
    impl Tool for LookupTool {
        fn name(&self) -> &str {
            "web_search"
        }
        fn description(&self) -> &str {
            "Search from web for a specific query."
        }
        fn parameters(&self) -> &ParameterSchema {
            &self.params
        }
        async fn invoke(
            &self,
            _arguments: serde_json::Map<String, serde_json::Value>,
        ) -> Result<String, ToolError> {
            Ok("Midnights was released in 2022".into())
        }
    }

    fn test_state(provider: MockProvider) -> SharedApiState {
        let provider: Arc<dyn Provider> = Arc::new(provider);
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(LookupTool::new())).unwrap();
        let tools = Arc::new(registry);

        Arc::new(ApiV1State {
            agent: ReactAgent::new(provider.clone(), tools),
            planner: TaskPlanner::new(provider.clone(), "English"),
            sampling: SamplingParams::default(),
            provider,
        })
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    /// The `data:` payloads of an SSE body, in order.
    fn sse_data(body: &str) -> Vec<String> {
        body.lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|data| data.trim_start().to_string())
            .collect()
    }

    #[tokio::test]
    async fn list_tools() {
        let app = v1_router(test_state(MockProvider::new(&["{}"])));
        let req = Request::builder()
            .uri("/tools")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: ToolListResponse = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json.count, 1);
        assert_eq!(json.tools[0].name, "web_search");
        assert_eq!(json.tools[0].parameters["query"].kind, "str");
    }

    #[tokio::test]
    async fn start_returns_sub_queries() {
        let app = v1_router(test_state(MockProvider::new(&[
            r#"answer: ["nutrition of almond milk", "nutrition of soy milk"]"#,
        ])));

        let response = app
            .oneshot(post_json(
                "/agent/start",
                serde_json::json!({"query": "Compare almond and soy milk", "temperature": 0.2}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let tasks: Vec<String> = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(tasks, vec!["nutrition of almond milk", "nutrition of soy milk"]);
    }

    #[tokio::test]
    async fn start_maps_model_failure_to_bad_gateway() {
        let app = v1_router(test_state(MockProvider::failing()));
        let response = app
            .oneshot(post_json("/agent/start", serde_json::json!({"query": "goal"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let err: ErrorResponse = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(err.error.starts_with("Task planning failed"));
    }

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let app = v1_router(test_state(MockProvider::new(&["{}"])));
        let response = app
            .oneshot(post_json("/agent/run", serde_json::json!({"query": "  "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn run_returns_answer_after_tool_round() {
        let app = v1_router(test_state(MockProvider::new(&[
            r#"{"tool": "web_search", "args": {"query": "Taylor Swift latest album"}}"#,
            r#"{"answer": "Her latest album is Midnights."}"#,
        ])));

        let response = app
            .oneshot(post_json(
                "/agent/run",
                serde_json::json!({"query": "What is Taylor Swift's latest album?"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let run: RunResponse = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(run.answer, "Her latest album is Midnights.");
        assert_eq!(run.outcome, "answer");
        assert_eq!(run.steps, 2);
        assert_eq!(run.tool_calls, 1);
    }

    #[tokio::test]
    async fn execute_streams_events_then_done() {
        let app = v1_router(test_state(MockProvider::new(&[
            r#"{"tool": "web_search", "args": {"query": "Midnights"}}"#,
            r#"{"answer": "Midnights"}"#,
        ])));

        let response = app
            .oneshot(post_json(
                "/agent/execute",
                serde_json::json!({"query": "latest album?"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()["content-type"]
                .to_str()
                .unwrap()
                .starts_with("text/event-stream")
        );

        let data = sse_data(&body_text(response).await);
        assert_eq!(data.len(), 4);
        assert_eq!(data[0], r#"{"tool":"web_search"}"#);
        assert!(data[1].contains("Midnights was released in 2022"));
        assert_eq!(data[2], r#"{"content":"Midnights"}"#);
        assert_eq!(data[3], "[DONE]");
    }

    #[tokio::test]
    async fn execute_reports_model_failure_in_stream() {
        let app = v1_router(test_state(MockProvider::failing()));
        let response = app
            .oneshot(post_json("/agent/execute", serde_json::json!({"query": "q"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let data = sse_data(&body_text(response).await);
        assert_eq!(data.len(), 2);
        assert!(data[0].contains("connection refused"));
        assert_eq!(data[1], "[DONE]");
    }

    #[tokio::test]
    async fn summarize_returns_json_string() {
        let app = v1_router(test_state(MockProvider::new(&["# Report\n\nAll good."])));
        let response = app
            .oneshot(post_json(
                "/agent/summarize",
                serde_json::json!({
                    "goal": "Write a report",
                    "language": "English",
                    "results": ["one", "two"]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let summary: String = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(summary, "# Report\n\nAll good.");
    }

    #[tokio::test]
    async fn summarize_streams_chunks_then_done() {
        let app = v1_router(test_state(MockProvider::new(&["Short summary"])));
        let response = app
            .oneshot(post_json(
                "/agent/summarize",
                serde_json::json!({"goal": "g", "results": ["r"], "streaming": true}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let data = sse_data(&body_text(response).await);
        assert_eq!(data, vec!["Short summary", "[DONE]"]);
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let base = SamplingParams::default();
        let overrides = SamplingOverrides {
            temperature: Some(0.7),
            max_new_tokens: Some(256),
            ..Default::default()
        };
        let params = overrides.apply(&base);
        assert_eq!(params.temperature, 0.7);
        assert_eq!(params.max_new_tokens, 256);
        assert_eq!(params.top_k, base.top_k);
        assert_eq!(params.top_p, base.top_p);
    }
}
