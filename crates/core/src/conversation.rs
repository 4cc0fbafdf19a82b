//! Conversation and Turn domain types.
//!
//! A conversation is the complete record of one agent run:
//! user query → model output → tool results → model output → ... → answer.
//! It is append-only so replaying it always reconstructs exactly what happened.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Unique identifier for a single agent run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Fresh per request, never reused; correlates the matching tool result.
    pub call_id: String,

    /// Name of the tool to invoke
    pub tool_name: String,

    /// Arguments exactly as the model produced them (after coercion)
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

impl ToolCallRequest {
    /// Create a request with a freshly generated call ID.
    pub fn new(
        tool_name: impl Into<String>,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            call_id: Uuid::new_v4().to_string(),
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

/// A `(title, url)` pair extracted from a web search result.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    pub title: String,
    pub url: String,
}

/// One atomic unit of conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Turn {
    /// The original user query. Always the first turn.
    UserQuery { text: String },

    /// What the model produced in one planning step.
    ModelOutput {
        raw_text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCallRequest>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        final_answer: Option<String>,
    },

    /// The outcome of a single tool call.
    ToolResult {
        call_id: String,
        tool_name: String,
        result_text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source_refs: Option<BTreeSet<SourceRef>>,
        #[serde(default)]
        is_error: bool,
    },
}

impl Turn {
    /// Text content of the turn, whatever its kind.
    pub fn text(&self) -> &str {
        match self {
            Turn::UserQuery { text } => text,
            Turn::ModelOutput {
                raw_text,
                final_answer,
                ..
            } => final_answer.as_deref().unwrap_or(raw_text),
            Turn::ToolResult { result_text, .. } => result_text,
        }
    }
}

/// An ordered, append-only sequence of turns for one agent run.
///
/// Only [`Conversation::new`] builds one, so the first turn is always the
/// user query. It serializes for logs and responses but is never read back.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: ConversationId,

    /// When this conversation was started
    pub created_at: DateTime<Utc>,

    turns: Vec<Turn>,
}

impl Conversation {
    /// Start a conversation from the user's query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            id: ConversationId::new(),
            created_at: Utc::now(),
            turns: vec![Turn::UserQuery { text: query.into() }],
        }
    }

    /// The original user query.
    pub fn query(&self) -> &str {
        match self.turns.first() {
            Some(Turn::UserQuery { text }) => text,
            _ => "",
        }
    }

    /// Append a turn.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// All turns, in insertion order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The text of the most recent tool result, if any tool has run.
    pub fn last_tool_output(&self) -> Option<&str> {
        self.turns.iter().rev().find_map(|t| match t {
            Turn::ToolResult { result_text, .. } => Some(result_text.as_str()),
            _ => None,
        })
    }

    /// Number of tool calls the model requested over the whole run.
    pub fn tool_calls_made(&self) -> usize {
        self.turns
            .iter()
            .map(|t| match t {
                Turn::ModelOutput { tool_calls, .. } => tool_calls.len(),
                _ => 0,
            })
            .sum()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Always false: a conversation holds at least the user query.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
