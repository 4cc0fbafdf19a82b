//! End-to-end integration tests for the aiagent runtime.
//!
//! These tests exercise the full pipeline from configuration to agent
//! output: config loading, tool catalog loading, real HTTP-backed tools
//! talking to in-process services, the ReAct loop, and the gateway.

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use http_body_util::BodyExt;
use tower::ServiceExt;

use aiagent_agent::{AgentStreamEvent, LoopOutcome, ReactAgent};
use aiagent_config::{AppConfig, ServicesConfig};
use aiagent_core::error::ProviderError;
use aiagent_core::provider::{Provider, SamplingParams};
use aiagent_core::tool::ToolRegistry;

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted responses in sequence and keeps
/// every prompt it was sent.
struct ScriptedProvider {
    responses: Vec<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(responses: &[&str]) -> Self {
        Self {
            responses: responses.iter().map(|r| r.to_string()).collect(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn prompt(&self, index: usize) -> String {
        self.prompts.lock().unwrap()[index].clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, prompt: &str, _params: &SamplingParams) -> Result<String, ProviderError> {
        let mut prompts = self.prompts.lock().unwrap();
        let index = prompts.len();
        if index >= self.responses.len() {
            panic!(
                "ScriptedProvider exhausted: call #{}, have {}",
                index,
                self.responses.len()
            );
        }
        prompts.push(prompt.to_string());
        Ok(self.responses[index].clone())
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

/// Serve `router` on an ephemeral local port and return its base URL.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Embedding + web retrieval services returning one Wikipedia hit.
fn web_services() -> Router {
    Router::new()
        .route("/embed", post(|| async { Json(serde_json::json!([[0.1, 0.2, 0.3]])) }))
        .route(
            "/v1/web_retrieval",
            post(|| async {
                Json(serde_json::json!({
                    "retrieved_docs": [
                        {"text": "title: Midnights - Wikipedia\nsource: https://en.wikipedia.org/wiki/Midnights\nMidnights is the tenth studio album by Taylor Swift, released in 2022."}
                    ]
                }))
            }),
        )
}

fn services_at(base: &str) -> ServicesConfig {
    ServicesConfig {
        tei_embedding_endpoint: Some(base.to_string()),
        web_retriever_endpoint: Some(base.to_string()),
        retrieval_endpoint: Some(format!("{base}/v1/retrieval")),
        tei_reranking_endpoint: Some(base.to_string()),
        image_gen_endpoint: Some(base.to_string()),
        max_attempts: 2,
        retry_backoff_ms: 0,
        request_timeout_secs: 5,
    }
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ── ReAct loop against real tools ────────────────────────────────────────

#[tokio::test]
async fn e2e_react_direct_answer_no_tools() {
    let provider = Arc::new(ScriptedProvider::new(&[r#"{"answer": "10"}"#]));
    let agent = ReactAgent::new(provider.clone(), Arc::new(ToolRegistry::new()));

    let result = agent.run("5 + 5?").await;

    assert_eq!(result.outcome, LoopOutcome::Answer("10".into()));
    assert_eq!(result.tool_calls_made(), 0);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn e2e_react_builtin_web_search_then_answer() {
    let base = serve(web_services()).await;
    let mut config = AppConfig::default();
    config.services = services_at(&base);
    let tools = Arc::new(aiagent_tools::load_registry(&config).unwrap());

    let provider = Arc::new(ScriptedProvider::new(&[
        r#"{"tool": "web_search", "args": {"query": "Taylor Swift latest album"}}"#,
        r#"{"answer": "Taylor Swift's latest album is Midnights."}"#,
    ]));
    let agent = ReactAgent::from_config(provider.clone(), tools, &config);

    let result = agent.run("What is the latest album by Taylor Swift?").await;

    assert!(result.answer().contains("Midnights"));
    assert_eq!(result.steps, 2);
    assert_eq!(result.tool_calls_made(), 1);

    // The second planning prompt replays the tool call and its output.
    let second = provider.prompt(1);
    assert!(second.contains(
        r#"Tool Call: web_search - {"query":"Taylor Swift latest album"}"#
    ));
    assert!(second.contains("Tool Output: title: Midnights - Wikipedia"));
}

#[tokio::test]
async fn e2e_stream_carries_web_sources() {
    let base = serve(web_services()).await;
    let mut config = AppConfig::default();
    config.services = services_at(&base);
    let tools = Arc::new(aiagent_tools::load_registry(&config).unwrap());

    let provider = Arc::new(ScriptedProvider::new(&[
        r#"{"tool": "web_search", "args": {"query": "Midnights"}}"#,
        r#"{"answer": "Midnights"}"#,
    ]));
    let agent = ReactAgent::from_config(provider, tools, &config);

    let mut rx = agent.run_stream("latest album?");
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert_eq!(events.len(), 4);
    match &events[1] {
        AgentStreamEvent::ToolOutput { tool, source, .. } => {
            assert_eq!(tool, "web_search");
            let source = source.as_ref().unwrap();
            assert_eq!(source.len(), 1);
            assert_eq!(source[0].url, "https://en.wikipedia.org/wiki/Midnights");
        }
        other => panic!("expected tool output, got {other:?}"),
    }
    assert_eq!(events[3], AgentStreamEvent::Done);
}

#[tokio::test]
async fn e2e_unconfigured_service_becomes_tool_error() {
    // No service endpoints: the tool fails, the loop carries on.
    let tools = Arc::new(aiagent_tools::load_registry(&AppConfig::default()).unwrap());
    let provider = Arc::new(ScriptedProvider::new(&[
        r#"{"tool": "image_generation", "args": {"prompt": "a cat"}}"#,
        r#"{"answer": "Image generation is unavailable."}"#,
    ]));
    let agent = ReactAgent::new(provider.clone(), tools);

    let result = agent.run("Draw a cat").await;

    assert_eq!(result.answer(), "Image generation is unavailable.");
    assert!(provider.prompt(1).contains("Tool Output: Error:"));
    assert!(provider.prompt(1).contains("image_gen endpoint is not configured"));
}

#[tokio::test]
async fn e2e_step_limit_returns_last_tool_output() {
    let base = serve(web_services()).await;
    let mut config = AppConfig::default();
    config.services = services_at(&base);
    config.agent.recursion_limit = 1;
    let tools = Arc::new(aiagent_tools::load_registry(&config).unwrap());

    let provider = Arc::new(ScriptedProvider::new(&[
        r#"{"tool": "web_search", "args": {"query": "again"}}"#,
    ]));
    let agent = ReactAgent::from_config(provider.clone(), tools, &config);

    let result = agent.run("loop forever").await;

    match result.outcome {
        LoopOutcome::StepLimitExceeded { best_effort } => {
            assert!(best_effort.contains("tenth studio album"));
        }
        other => panic!("expected step limit, got {other:?}"),
    }
    assert_eq!(provider.calls(), 1);
}

// ── Tool catalog ─────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_catalog_http_tool_invocation() {
    let received = Arc::new(Mutex::new(None::<serde_json::Value>));
    let sink = received.clone();
    let base = serve(Router::new().route(
        "/weather",
        post(move |Json(body): Json<serde_json::Value>| {
            let sink = sink.clone();
            async move {
                *sink.lock().unwrap() = Some(body);
                "Sunny, 24C"
            }
        }),
    ))
    .await;

    let dir = tempfile::tempdir().unwrap();
    let catalog = dir.path().join("tools.yaml");
    std::fs::write(
        &catalog,
        format!(
            "weather:\n  description: Current weather for a city.\n  callable_api: {base}/weather\n  args_schema:\n    query:\n      type: str\n      description: city name\n"
        ),
    )
    .unwrap();

    let mut config = AppConfig::default();
    config.agent.tool_catalog = Some(catalog);
    let tools = Arc::new(aiagent_tools::load_registry(&config).unwrap());
    assert_eq!(tools.names(), vec!["weather"]);

    let provider = Arc::new(ScriptedProvider::new(&[
        r#"{"tool": "weather", "args": {"query": "Lisbon"}}"#,
        r#"{"answer": "It is sunny in Lisbon."}"#,
    ]));
    let agent = ReactAgent::from_config(provider.clone(), tools, &config);

    let result = agent.run("Weather in Lisbon?").await;

    assert_eq!(result.answer(), "It is sunny in Lisbon.");
    assert_eq!(
        received.lock().unwrap().clone(),
        Some(serde_json::json!({"query": "Lisbon"}))
    );
    assert!(provider.prompt(0).contains(
        "weather - Current weather for a city., args: [{'name': 'query', 'type': 'str', 'description': 'city name', 'required': True}]"
    ));
    assert!(provider.prompt(1).contains("Tool Output: Sunny, 24C"));
}

#[tokio::test]
async fn e2e_catalog_rejects_endpoint_without_schema() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = dir.path().join("tools.yaml");
    std::fs::write(
        &catalog,
        "broken:\n  description: No schema here.\n  callable_api: http://localhost:1/x\n",
    )
    .unwrap();

    let mut config = AppConfig::default();
    config.agent.tool_catalog = Some(catalog);

    let err = aiagent_tools::load_registry(&config).err().unwrap();
    assert!(err.to_string().contains("args_schema"));
}

// ── Configuration ────────────────────────────────────────────────────────

#[test]
fn e2e_config_file_and_env_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[agent]\nrecursion_limit = 3\nlanguage = \"French\"\n\n[llm]\nendpoint_url = \"http://tgi:80\"\n",
    )
    .unwrap();

    let mut config = AppConfig::load_from(&path).unwrap();
    assert_eq!(config.agent.recursion_limit, 3);
    assert_eq!(config.agent.language, "French");
    assert_eq!(config.llm.endpoint_url, "http://tgi:80");
    assert_eq!(config.gateway.port, AppConfig::default().gateway.port);

    config
        .apply_overrides(|key| match key {
            "RECURSION_LIMIT" => Some("7".into()),
            "WEB_RETRIEVER_ENDPOINT" => Some("http://web:7078".into()),
            _ => None,
        })
        .unwrap();
    assert_eq!(config.agent.recursion_limit, 7);
    assert_eq!(
        config.services.web_retriever_endpoint.as_deref(),
        Some("http://web:7078")
    );
    assert!(config.validate().is_ok());
}

#[test]
fn e2e_config_rejects_zero_recursion_limit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[agent]\nrecursion_limit = 0\n").unwrap();
    assert!(AppConfig::load_from(&path).is_err());
}

// ── Gateway ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_gateway_health_tools_and_run() {
    let base = serve(web_services()).await;
    let mut config = AppConfig::default();
    config.services = services_at(&base);
    let tools = Arc::new(aiagent_tools::load_registry(&config).unwrap());

    let provider = Arc::new(ScriptedProvider::new(&[
        r#"{"tool": "web_search", "args": {"query": "Taylor Swift"}}"#,
        r#"{"answer": "Midnights"}"#,
    ]));
    let app = aiagent_gateway::build_router(aiagent_gateway::build_state(provider, tools, &config));

    let health = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    let health: serde_json::Value = serde_json::from_str(&body_text(health).await).unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["tools"], 3);
    assert_eq!(health["model_reachable"], true);

    let listing = app
        .clone()
        .oneshot(Request::builder().uri("/v1/tools").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let listing: serde_json::Value = serde_json::from_str(&body_text(listing).await).unwrap();
    assert_eq!(listing["count"], 3);
    assert_eq!(listing["tools"][0]["name"], "web_search");

    let run = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/agent/run")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"query": "Latest Taylor Swift album?"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(run.status(), StatusCode::OK);
    let run: serde_json::Value = serde_json::from_str(&body_text(run).await).unwrap();
    assert_eq!(run["answer"], "Midnights");
    assert_eq!(run["outcome"], "answer");
    assert_eq!(run["steps"], 2);
}
