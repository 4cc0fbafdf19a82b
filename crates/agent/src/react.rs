//! ReAct agent — Plan → Act → Observe until the model answers.
//!
//! # States
//!
//! ```text
//! Planning ──tool calls──▶ ToolDispatch ──step_count < limit──▶ Planning
//!    │                          │
//!    │ answer / unparsed        └──step_count == limit──▶ Terminated(StepLimitExceeded)
//!    ▼
//! Terminated(Answer)        model failure ──▶ Terminated(Error)
//! ```
//!
//! A streaming run additionally stops as `Cancelled` once its consumer has
//! gone away; the check happens before every model or tool invocation.
//!
//! Each run owns its conversation. The provider and registry are shared and
//! read-only, so one agent can serve any number of concurrent runs.

use std::sync::Arc;

use aiagent_config::AppConfig;
use aiagent_core::conversation::{Conversation, ToolCallRequest, Turn};
use aiagent_core::provider::{Provider, SamplingParams};
use aiagent_core::tool::ToolRegistry;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dispatcher::ToolDispatcher;
use crate::parser::{OutputInterpreter, ParsedOutput};
use crate::prompt::react_prompt;
use crate::stream_event::AgentStreamEvent;
use crate::transcript::build_history;

/// Default number of tool-dispatch rounds before the loop gives up.
pub const DEFAULT_STEP_LIMIT: u32 = 5;

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopOutcome {
    /// The model produced an answer (or unparseable text, taken verbatim).
    Answer(String),
    /// Ran out of steps; carries the last tool output as best effort.
    StepLimitExceeded { best_effort: String },
    /// The model could not be reached; carries the rendered error.
    Error(String),
    /// The streaming consumer disconnected.
    Cancelled,
}

impl LoopOutcome {
    /// The user-visible result text.
    pub fn text(&self) -> &str {
        match self {
            Self::Answer(text) => text,
            Self::StepLimitExceeded { best_effort } => best_effort,
            Self::Error(message) => message,
            Self::Cancelled => "",
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Answer(_) => "answer",
            Self::StepLimitExceeded { .. } => "step_limit_exceeded",
            Self::Error(_) => "error",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Where the loop is.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Planning,
    ToolDispatch(Vec<ToolCallRequest>),
    Terminated(LoopOutcome),
}

/// Per-run mutable state. Dropped when the run terminates.
#[derive(Debug)]
pub struct LoopState {
    pub conversation: Conversation,
    /// Completed tool-dispatch rounds.
    pub step_count: u32,
    pub step_limit: u32,
    /// Model invocations made.
    pub planning_steps: u32,
}

impl LoopState {
    pub fn new(query: &str, step_limit: u32) -> Self {
        Self {
            conversation: Conversation::new(query),
            step_count: 0,
            step_limit: step_limit.max(1),
            planning_steps: 0,
        }
    }
}

/// The result of a ReAct execution.
#[derive(Debug, Clone)]
pub struct ReactResult {
    pub outcome: LoopOutcome,
    /// Complete record of the run.
    pub conversation: Conversation,
    /// Number of planning (model) steps taken.
    pub steps: u32,
}

impl ReactResult {
    /// The final answer, best effort, or error text.
    pub fn answer(&self) -> &str {
        self.outcome.text()
    }

    pub fn tool_calls_made(&self) -> usize {
        self.conversation.tool_calls_made()
    }
}

/// A ReAct agent bound to one provider and one tool registry.
#[derive(Clone)]
pub struct ReactAgent {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    sampling: SamplingParams,
    step_limit: u32,
    language: String,
    interpreter: OutputInterpreter,
    dispatcher: ToolDispatcher,
}

impl ReactAgent {
    pub fn new(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            tools,
            sampling: SamplingParams::default(),
            step_limit: DEFAULT_STEP_LIMIT,
            language: "English".into(),
            interpreter: OutputInterpreter::new(),
            dispatcher: ToolDispatcher::new(),
        }
    }

    /// Build an agent with the sampling, step limit and language from `config`.
    pub fn from_config(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        config: &AppConfig,
    ) -> Self {
        Self::new(provider, tools)
            .with_sampling(config.llm.sampling.clone())
            .with_step_limit(config.agent.recursion_limit)
            .with_language(config.agent.language.clone())
    }

    /// Set the maximum number of tool-dispatch rounds (at least 1).
    pub fn with_step_limit(mut self, step_limit: u32) -> Self {
        self.step_limit = step_limit.max(1);
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn step_limit(&self) -> u32 {
        self.step_limit
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run to completion and return the full result.
    pub async fn run(&self, query: &str) -> ReactResult {
        self.drive(query, None).await
    }

    /// Run in a background task, streaming events as they happen.
    ///
    /// The stream always ends with [`AgentStreamEvent::Done`] unless the
    /// receiver is dropped first, in which case the run is cancelled.
    pub fn run_stream(&self, query: &str) -> mpsc::Receiver<AgentStreamEvent> {
        let (tx, rx) = mpsc::channel(64);
        let agent = self.clone();
        let query = query.to_string();

        tokio::spawn(async move {
            let result = agent.drive(&query, Some(&tx)).await;

            let terminal = match result.outcome {
                LoopOutcome::Answer(text) => Some(AgentStreamEvent::answer(&text)),
                LoopOutcome::StepLimitExceeded { best_effort } => {
                    Some(AgentStreamEvent::answer(&best_effort))
                }
                LoopOutcome::Error(message) => Some(AgentStreamEvent::Error { message }),
                LoopOutcome::Cancelled => None,
            };

            if let Some(event) = terminal {
                if tx.send(event).await.is_err() {
                    return; // receiver dropped
                }
                let _ = tx.send(AgentStreamEvent::Done).await;
            }
        });

        rx
    }

    async fn drive(&self, query: &str, sink: Option<&mpsc::Sender<AgentStreamEvent>>) -> ReactResult {
        info!(step_limit = self.step_limit, tools = self.tools.len(), "Starting ReAct run");

        let mut state = LoopState::new(query, self.step_limit);
        let catalog = self.tools.describe_all();
        let mut phase = Phase::Planning;

        let outcome = loop {
            phase = match phase {
                Phase::Terminated(outcome) => break outcome,
                _ if is_closed(sink) => {
                    warn!("Stream consumer disconnected, cancelling run");
                    Phase::Terminated(LoopOutcome::Cancelled)
                }
                Phase::Planning => self.plan(&mut state, &catalog, sink).await,
                Phase::ToolDispatch(requests) => self.act(&mut state, &requests, sink).await,
            };
        };

        info!(
            outcome = outcome.kind(),
            steps = state.planning_steps,
            tool_calls = state.conversation.tool_calls_made(),
            "ReAct run finished"
        );

        ReactResult {
            outcome,
            steps: state.planning_steps,
            conversation: state.conversation,
        }
    }

    /// One planning step: render the prompt, ask the model, classify the reply.
    async fn plan(
        &self,
        state: &mut LoopState,
        catalog: &str,
        sink: Option<&mpsc::Sender<AgentStreamEvent>>,
    ) -> Phase {
        state.planning_steps += 1;
        let history = build_history(&state.conversation);
        let prompt = react_prompt(state.conversation.query(), &history, catalog, &self.language);

        debug!(step = state.planning_steps, prompt_chars = prompt.len(), "Planning step");

        let raw = match self.provider.complete(&prompt, &self.sampling).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(provider = self.provider.name(), error = %e, "Model invocation failed");
                return Phase::Terminated(LoopOutcome::Error(e.to_string()));
            }
        };

        let interpretation = self.interpreter.interpret(&raw);
        if !interpretation.rejected.is_empty() {
            debug!(rejected = interpretation.rejected.len(), "Some output lines were not JSON");
        }

        match interpretation.output {
            ParsedOutput::ToolCalls(calls) => {
                let requests = self.dispatcher.prepare(&calls, &self.tools);
                for request in &requests {
                    emit(sink, AgentStreamEvent::ToolStarted {
                        tool: request.tool_name.clone(),
                    })
                    .await;
                }
                state.conversation.push(Turn::ModelOutput {
                    raw_text: raw,
                    tool_calls: requests.clone(),
                    final_answer: None,
                });
                Phase::ToolDispatch(requests)
            }
            ParsedOutput::Answer(answer) | ParsedOutput::Unparsed(answer) => {
                state.conversation.push(Turn::ModelOutput {
                    raw_text: raw,
                    tool_calls: Vec::new(),
                    final_answer: Some(answer.clone()),
                });
                Phase::Terminated(LoopOutcome::Answer(answer))
            }
        }
    }

    /// One dispatch step: run the batch, record results, decide whether to continue.
    async fn act(
        &self,
        state: &mut LoopState,
        requests: &[ToolCallRequest],
        sink: Option<&mpsc::Sender<AgentStreamEvent>>,
    ) -> Phase {
        let outcomes = self.dispatcher.execute(requests, &self.tools).await;

        for outcome in &outcomes {
            emit(sink, AgentStreamEvent::ToolOutput {
                tool: outcome.tool_name.clone(),
                content: outcome.result_text.clone(),
                source: outcome
                    .source_refs
                    .as_ref()
                    .map(|refs| refs.iter().cloned().collect()),
            })
            .await;
            state.conversation.push(outcome.to_turn());
        }

        state.step_count += 1;
        if state.step_count < state.step_limit {
            return Phase::Planning;
        }

        warn!(step_limit = state.step_limit, "Step limit reached without an answer");
        let best_effort = state
            .conversation
            .last_tool_output()
            .unwrap_or_default()
            .to_string();
        Phase::Terminated(LoopOutcome::StepLimitExceeded { best_effort })
    }
}

fn is_closed(sink: Option<&mpsc::Sender<AgentStreamEvent>>) -> bool {
    sink.is_some_and(|tx| tx.is_closed())
}

async fn emit(sink: Option<&mpsc::Sender<AgentStreamEvent>>, event: AgentStreamEvent) {
    if let Some(tx) = sink {
        // A failed send means the receiver is gone; the next phase notices
        let _ = tx.send(event).await;
    }
}
