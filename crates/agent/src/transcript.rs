//! Execution history rendering.
//!
//! Turns the conversation (minus the user query, which the prompt carries
//! separately) into the plain-text history block of the ReAct prompt.

use aiagent_core::conversation::{Conversation, Turn};

/// Render every turn after the first, one line per tool call, answer or
/// tool output, in conversation order.
pub fn build_history(conversation: &Conversation) -> String {
    let mut lines = Vec::new();
    let mut assistant_outputs = 0;

    for turn in conversation.turns().iter().skip(1) {
        match turn {
            Turn::ModelOutput { tool_calls, .. } if !tool_calls.is_empty() => {
                for call in tool_calls {
                    let args = serde_json::Value::Object(call.arguments.clone());
                    lines.push(format!("Tool Call: {} - {}", call.tool_name, args));
                }
            }
            Turn::ModelOutput { .. } => {
                assistant_outputs += 1;
                lines.push(format!("Assistant Output {assistant_outputs}: {}", turn.text()));
            }
            Turn::ToolResult { result_text, .. } => {
                lines.push(format!("Tool Output: {result_text}"));
            }
            // A repeated query has nothing to contribute to the history
            Turn::UserQuery { .. } => {}
        }
    }

    lines.join("\n")
}
