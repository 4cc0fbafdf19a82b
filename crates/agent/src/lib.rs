//! The ReAct agent loop.
//!
//! The agent follows a **Plan → Act → Observe** cycle:
//!
//! 1. **Plan**: render the tool catalog and execution history into the
//!    ReAct prompt and ask the model what to do next
//! 2. **Interpret** the reply: JSON tool calls, a JSON answer, or free text
//! 3. **Act**: run the requested tools concurrently, append their outputs
//! 4. Loop back to step 1 until the model answers or the step limit is hit
//!
//! `TaskPlanner` adds the single-shot calls around a session: splitting a
//! goal into sub-queries and summarizing their results.

pub mod dispatcher;
pub mod parser;
pub mod prompt;
pub mod react;
pub mod stream_event;
pub mod tasks;
pub mod transcript;

#[cfg(test)]
mod test_helpers;

pub use dispatcher::{ToolDispatcher, ToolOutcome};
pub use parser::{Interpretation, OutputInterpreter, ParsedOutput, ParsedToolCall, RejectedLine};
pub use react::{LoopOutcome, LoopState, Phase, ReactAgent, ReactResult};
pub use stream_event::AgentStreamEvent;
pub use tasks::TaskPlanner;
