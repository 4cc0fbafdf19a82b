//! # aiagent Core
//!
//! Domain types, traits, and error definitions for the aiagent ReAct runtime.
//! This crate has **zero framework dependencies** — it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The two external collaborators of the agent loop — the language model and
//! the tools — are defined as traits here. Implementations live in their
//! respective crates. This enables:
//! - Swapping model backends and tool catalogs via configuration
//! - Easy testing with scripted mock implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod conversation;
pub mod error;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use conversation::{Conversation, ConversationId, SourceRef, ToolCallRequest, Turn};
pub use error::{ProviderError, ToolError};
pub use provider::{Provider, SamplingParams};
pub use tool::{ParamSpec, ParameterSchema, Tool, ToolDefinition, ToolRegistry};
