//! Output interpreter — turns free model text into tool calls or an answer.
//!
//! The model is asked to emit one JSON object per line. In practice it also
//! emits prose, code fences and chat-template leftovers, so parsing is
//! line-by-line and permissive: anything that is not a JSON object is
//! recorded as a rejected line and skipped, never raised.

use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Chat-template token some models leak into their output.
const ROLE_TOKEN: &str = "assistant";

/// One requested tool invocation, before a call ID is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedToolCall {
    pub tool: String,
    pub args: Map<String, Value>,
}

/// What the model asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedOutput {
    /// At least one line carried a `"tool"` key.
    ToolCalls(Vec<ParsedToolCall>),
    /// The first parsed object carried an `"answer"` key.
    Answer(String),
    /// Nothing usable was parsed; the raw text, untouched.
    Unparsed(String),
}

/// A line that could not be used, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedLine {
    /// 1-based line number in the raw output.
    pub line_no: usize,
    pub reason: String,
}

/// Parse result plus diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpretation {
    pub output: ParsedOutput,
    pub rejected: Vec<RejectedLine>,
}

/// Stateless interpreter of planning-step output.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputInterpreter;

impl OutputInterpreter {
    pub fn new() -> Self {
        Self
    }

    /// Classify `raw`, dropping diagnostics.
    pub fn parse(&self, raw: &str) -> ParsedOutput {
        self.interpret(raw).output
    }

    /// Classify `raw` and report every line that was skipped.
    pub fn interpret(&self, raw: &str) -> Interpretation {
        let mut objects = Vec::new();
        let mut rejected = Vec::new();

        for (i, line) in raw.split('\n').enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match parse_line(line) {
                Ok(object) => objects.push(object),
                Err(reason) => {
                    debug!(line_no = i + 1, %reason, "Skipping unparseable output line");
                    rejected.push(RejectedLine {
                        line_no: i + 1,
                        reason,
                    });
                }
            }
        }

        let calls: Vec<ParsedToolCall> = objects.iter().filter_map(tool_call).collect();

        let output = if !calls.is_empty() {
            ParsedOutput::ToolCalls(calls)
        } else if let Some(answer) = objects.first().and_then(|o| o.get("answer")) {
            ParsedOutput::Answer(match answer {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
        } else {
            ParsedOutput::Unparsed(raw.to_string())
        };

        Interpretation { output, rejected }
    }
}

/// Parse one line as a JSON object, retrying once without the role token.
///
/// A line that already parses is returned untouched, even if it contains the
/// role token; stripping applies only to the retry.
fn parse_line(line: &str) -> Result<Map<String, Value>, String> {
    match as_object(line) {
        Ok(object) => Ok(object),
        Err(first) if line.contains(ROLE_TOKEN) => {
            let stripped = line.replace(ROLE_TOKEN, "");
            as_object(stripped.trim()).map_err(|_| first)
        }
        Err(first) => Err(first),
    }
}

fn as_object(text: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err("not a JSON object".into()),
        Err(e) => Err(e.to_string()),
    }
}

fn tool_call(object: &Map<String, Value>) -> Option<ParsedToolCall> {
    let tool = match object.get("tool")? {
        Value::String(name) => name.clone(),
        other => other.to_string(),
    };

    let args = match object.get("args") {
        Some(Value::Object(args)) => args.clone(),
        None | Some(Value::Null) => Map::new(),
        Some(other) => {
            warn!(tool = %tool, args = %other, "Tool arguments are not an object, ignoring them");
            Map::new()
        }
    };

    Some(ParsedToolCall { tool, args })
}
