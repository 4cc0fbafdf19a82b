//! HTTP API gateway for aiagent.
//!
//! Exposes the ReAct agent, the task planner and the summarizer over HTTP,
//! plus a health check and a tool listing.
//!
//! Built on Axum; streaming endpoints use server-sent events.

pub mod api_v1;

use axum::extract::DefaultBodyLimit;
use axum::{Router, extract::State, http::StatusCode, response::Json, routing::get};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use aiagent_agent::{ReactAgent, TaskPlanner};
use aiagent_config::AppConfig;
use aiagent_core::provider::Provider;

pub use api_v1::{ApiV1State, SharedApiState};

/// Request bodies carry whole result sets for summarization.
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Build the full router: `/health` plus the v1 API under `/v1`.
pub fn build_router(state: SharedApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .with_state(state.clone())
        .nest("/v1", api_v1::v1_router(state))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Assemble the shared state from an already-built provider and tool registry.
pub fn build_state(
    provider: Arc<dyn Provider>,
    tools: Arc<aiagent_core::tool::ToolRegistry>,
    config: &AppConfig,
) -> SharedApiState {
    Arc::new(ApiV1State {
        agent: ReactAgent::from_config(provider.clone(), tools, config),
        planner: TaskPlanner::new(provider.clone(), config.agent.language.clone()),
        sampling: config.llm.sampling.clone(),
        provider,
    })
}

/// Start the gateway HTTP server.
///
/// Builds the provider and the tool registry once and shares them across
/// every request.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let provider = aiagent_providers::build_from_config(&config)?;
    let tools = Arc::new(aiagent_tools::load_registry(&config)?);
    info!(tools = ?tools.names(), "Tool registry ready");

    let app = build_router(build_state(provider, tools, &config));

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub tools: usize,
    /// Whether the model backend answered its own health check.
    pub model_reachable: bool,
}

async fn health_handler(State(state): State<SharedApiState>) -> (StatusCode, Json<HealthResponse>) {
    let model_reachable = match state.provider.health_check().await {
        Ok(up) => up,
        Err(e) => {
            warn!(provider = state.provider.name(), error = %e, "Model health check failed");
            false
        }
    };

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: if model_reachable { "ok" } else { "degraded" }.into(),
            version: env!("CARGO_PKG_VERSION").into(),
            tools: state.agent.tools().len(),
            model_reachable,
        }),
    )
}
