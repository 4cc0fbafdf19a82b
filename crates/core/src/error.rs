//! Error types for the aiagent domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error type; crates outside core add
//! theirs (`ConfigError`, `CatalogError`) next to the code that raises them.

use thiserror::Error;

/// Failures talking to the language model.
///
/// Any of these is fatal to the request that triggered it: the agent loop
/// terminates and surfaces the rendered error as its visible result.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures resolving or invoking a tool.
///
/// None of these abort the agent loop. The dispatcher turns them into a
/// tool result carrying the rendered error.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Duplicate tool: {0} is already registered")]
    Duplicate(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("{service} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        service: String,
        attempts: u32,
        last_error: String,
    },
}
