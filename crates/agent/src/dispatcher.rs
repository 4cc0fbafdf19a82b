//! Tool dispatcher — executes one planning step's batch of tool calls.
//!
//! Every call gets a fresh call ID and yields exactly one outcome, in the
//! order the model asked for them. Unknown tools and failing tools become
//! error outcomes; nothing here aborts the agent loop.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use aiagent_core::conversation::{SourceRef, ToolCallRequest, Turn};
use aiagent_core::tool::{ParameterSchema, ToolRegistry};
use futures::future::join_all;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::parser::ParsedToolCall;

static WEB_SOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"title:\s*(.+?)\s*\n.*?source:\s*(https?://\S+)").unwrap()
});

/// The result of one tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub call_id: String,
    pub tool_name: String,
    pub result_text: String,
    pub source_refs: Option<BTreeSet<SourceRef>>,
    pub is_error: bool,
}

impl ToolOutcome {
    pub fn to_turn(&self) -> Turn {
        Turn::ToolResult {
            call_id: self.call_id.clone(),
            tool_name: self.tool_name.clone(),
            result_text: self.result_text.clone(),
            source_refs: self.source_refs.clone(),
            is_error: self.is_error,
        }
    }
}

/// Resolves and runs tool calls against a registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolDispatcher;

impl ToolDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Assign call IDs and coerce arguments against each tool's schema.
    pub fn prepare(&self, calls: &[ParsedToolCall], registry: &ToolRegistry) -> Vec<ToolCallRequest> {
        calls
            .iter()
            .map(|call| {
                let args = match registry.lookup(&call.tool) {
                    Ok(tool) => coerce_arguments(call.args.clone(), tool.parameters()),
                    Err(_) => call.args.clone(),
                };
                ToolCallRequest::new(call.tool.clone(), args)
            })
            .collect()
    }

    /// Run a prepared batch concurrently; outcomes come back in request order.
    pub async fn execute(&self, requests: &[ToolCallRequest], registry: &ToolRegistry) -> Vec<ToolOutcome> {
        info!(calls = requests.len(), "Dispatching tool calls");
        join_all(requests.iter().map(|request| run_one(request, registry))).await
    }

    /// `prepare` then `execute`, pairing each request with its outcome.
    pub async fn dispatch(
        &self,
        calls: &[ParsedToolCall],
        registry: &ToolRegistry,
    ) -> Vec<(ToolCallRequest, ToolOutcome)> {
        let requests = self.prepare(calls, registry);
        let outcomes = self.execute(&requests, registry).await;
        requests.into_iter().zip(outcomes).collect()
    }
}

async fn run_one(request: &ToolCallRequest, registry: &ToolRegistry) -> ToolOutcome {
    let (result_text, is_error) = match registry.lookup(&request.tool_name) {
        Err(e) => {
            warn!(tool = %request.tool_name, "Model requested an unregistered tool");
            (format!("Error: {e}"), true)
        }
        Ok(tool) => {
            debug!(tool = %request.tool_name, call_id = %request.call_id, "Invoking tool");
            match tool.invoke(request.arguments.clone()).await {
                Ok(text) => (text, false),
                Err(e) => {
                    warn!(tool = %request.tool_name, error = %e, "Tool invocation failed");
                    (format!("Error: {e}"), true)
                }
            }
        }
    };

    let source_refs = (request.tool_name.contains("web") && !is_error)
        .then(|| extract_web_sources(&result_text));

    ToolOutcome {
        call_id: request.call_id.clone(),
        tool_name: request.tool_name.clone(),
        result_text,
        source_refs,
        is_error,
    }
}

/// Pull `(title, url)` pairs out of web search text.
pub fn extract_web_sources(text: &str) -> BTreeSet<SourceRef> {
    WEB_SOURCE
        .captures_iter(text)
        .map(|caps| SourceRef {
            title: caps[1].to_string(),
            url: caps[2].to_string(),
        })
        .collect()
}

/// Best-effort conversion of argument values to their declared types.
/// Values that do not convert cleanly, and arguments the schema does not
/// declare, pass through untouched.
pub fn coerce_arguments(mut args: Map<String, Value>, schema: &ParameterSchema) -> Map<String, Value> {
    for (name, value) in args.iter_mut() {
        let Some(spec) = schema.get(name) else {
            continue;
        };
        if let Some(coerced) = coerce(value, &spec.kind) {
            *value = coerced;
        }
    }
    args
}

fn coerce(value: &Value, kind: &str) -> Option<Value> {
    match (kind.to_ascii_lowercase().as_str(), value) {
        ("int" | "integer", Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
        ("int" | "integer", Value::Number(n)) if n.is_f64() => n
            .as_f64()
            .filter(|f| f.fract() == 0.0)
            .map(|f| Value::from(f as i64)),
        ("float" | "number", Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        ("bool" | "boolean", Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        ("str" | "string", Value::Number(n)) => Some(Value::String(n.to_string())),
        ("str" | "string", Value::Bool(b)) => Some(Value::String(b.to_string())),
        _ => None,
    }
}
