//! Agent-level streaming events.
//!
//! `AgentStreamEvent` is what `ReactAgent::run_stream` emits and what the
//! gateway forwards to clients over SSE, one `data:` line per event.

use aiagent_core::conversation::SourceRef;
use serde::Serialize;

/// Events emitted by the agent during streaming execution.
///
/// Wire payloads:
/// - `{"tool": name}`                           — a tool call is starting
/// - `{"content": text}`                        — the final answer
/// - `{"tool": name, "content": text, "source": [..]}` — a tool finished
/// - raw error text                             — the run failed
/// - `[DONE]`                                   — the stream is complete
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AgentStreamEvent {
    /// The agent is calling a tool.
    ToolStarted { tool: String },

    /// Final answer, newlines collapsed to spaces.
    Answer { content: String },

    /// Tool execution completed. `source` is only set for web tools.
    ToolOutput {
        tool: String,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        source: Option<Vec<SourceRef>>,
    },

    /// The run failed.
    Error { message: String },

    /// The stream is complete.
    Done,
}

impl AgentStreamEvent {
    /// Build an answer event, flattening the text onto one line.
    pub fn answer(text: &str) -> Self {
        Self::Answer {
            content: text.replace('\n', " "),
        }
    }

    /// Name of this event type; the gateway sends it as the SSE `event:` field.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ToolStarted { .. } => "tool_started",
            Self::Answer { .. } => "answer",
            Self::ToolOutput { .. } => "tool_output",
            Self::Error { .. } => "error",
            Self::Done => "done",
        }
    }

    /// The `data:` payload of the SSE frame for this event.
    pub fn to_sse_data(&self) -> String {
        match self {
            Self::Error { message } => message.clone(),
            Self::Done => "[DONE]".into(),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }
}
