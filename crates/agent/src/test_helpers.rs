//! Shared test helpers for agent tests.

use std::sync::Mutex;

use aiagent_core::error::{ProviderError, ToolError};
use aiagent_core::provider::{Provider, SamplingParams};
use aiagent_core::tool::{ParamSpec, ParameterSchema, Tool};
use async_trait::async_trait;

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue and
/// records the prompt it was given. Panics if more calls are made than
/// responses provided.
pub struct ScriptedProvider {
    responses: Mutex<Vec<Result<String, ProviderError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A provider whose every reply succeeds with the given texts.
    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(
        &self,
        prompt: &str,
        _params: &SamplingParams,
    ) -> Result<String, ProviderError> {
        let mut prompts = self.prompts.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let index = prompts.len();

        if index >= responses.len() {
            panic!(
                "ScriptedProvider: no more responses (call #{}, have {})",
                index,
                responses.len()
            );
        }

        prompts.push(prompt.to_string());
        responses[index].clone()
    }
}

/// A tool that always returns the same text.
pub struct StaticTool {
    name: String,
    output: String,
    parameters: ParameterSchema,
}

impl StaticTool {
    pub fn new(name: &str, output: &str) -> Self {
        let mut parameters = ParameterSchema::new();
        parameters.insert("query".into(), ParamSpec::new("str", "what to look up"));
        Self {
            name: name.into(),
            output: output.into(),
            parameters,
        }
    }
}

#[async_trait]
impl Tool for StaticTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Returns canned text"
    }

    fn parameters(&self) -> &ParameterSchema {
        &self.parameters
    }

    async fn invoke(
        &self,
        _arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Result<String, ToolError> {
        Ok(self.output.clone())
    }
}

/// A tool that always fails.
pub struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "broken"
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    fn parameters(&self) -> &ParameterSchema {
        static EMPTY: std::sync::LazyLock<ParameterSchema> =
            std::sync::LazyLock::new(ParameterSchema::new);
        &EMPTY
    }

    async fn invoke(
        &self,
        _arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Result<String, ToolError> {
        Err(ToolError::ExecutionFailed {
            tool_name: "broken".into(),
            reason: "service down".into(),
        })
    }
}
