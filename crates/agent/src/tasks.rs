//! Task planning and summarization.
//!
//! Two single-shot model calls that bracket an agent session: `start`
//! breaks a goal into a handful of search queries, `summarize` folds the
//! collected results back into one document.

use std::sync::{Arc, LazyLock};

use aiagent_core::error::ProviderError;
use aiagent_core::provider::{Provider, SamplingParams};
use regex::Regex;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::prompt::{start_prompt, summarize_prompt};

/// Generation budget for the task list.
pub const START_MAX_NEW_TOKENS: u32 = 128;

/// Upper bound on sub-queries returned by `start`.
pub const MAX_TASKS: usize = 5;

static ANSWER_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"answer: \[(.*?)\]").unwrap());

static ANY_LIST: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[^\[\]]*\]").unwrap());

/// Plans sub-queries for a goal and summarizes their results.
#[derive(Clone)]
pub struct TaskPlanner {
    provider: Arc<dyn Provider>,
    language: String,
}

impl TaskPlanner {
    pub fn new(provider: Arc<dyn Provider>, language: impl Into<String>) -> Self {
        Self {
            provider,
            language: language.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Break `goal` into at most [`MAX_TASKS`] search queries.
    pub async fn start(&self, goal: &str, params: &SamplingParams) -> Result<Vec<String>, ProviderError> {
        let prompt = start_prompt(goal, &self.language);
        let params = params.clone().with_max_new_tokens(START_MAX_NEW_TOKENS);

        let text = self.provider.complete(&prompt, &params).await?;
        debug!(output = %text, "Task list generation");

        let tasks = extract_task_list(&text);
        info!(tasks = tasks.len(), "Planned sub-queries");
        Ok(tasks)
    }

    /// Combine `results` into one document written for `goal`.
    pub async fn summarize(
        &self,
        goal: &str,
        language: Option<&str>,
        results: &[String],
        params: &SamplingParams,
    ) -> Result<String, ProviderError> {
        let prompt = self.summary_prompt(goal, language, results);
        self.provider.complete(&prompt, params).await
    }

    /// Streaming variant of [`TaskPlanner::summarize`].
    pub async fn summarize_stream(
        &self,
        goal: &str,
        language: Option<&str>,
        results: &[String],
        params: &SamplingParams,
    ) -> Result<mpsc::Receiver<Result<String, ProviderError>>, ProviderError> {
        let prompt = self.summary_prompt(goal, language, results);
        self.provider.stream(&prompt, params).await
    }

    fn summary_prompt(&self, goal: &str, language: Option<&str>, results: &[String]) -> String {
        let language = language
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(&self.language);
        let text = results.join(" ");
        debug!(results = results.len(), text_chars = text.len(), "Summarizing results");
        summarize_prompt(goal, language, &text)
    }
}

/// Pull the sub-queries out of the model's task list output.
///
/// Looks for `answer: [...]` lists first (the format the prompt's examples
/// use), then falls back to the first JSON array of strings in the text.
pub fn extract_task_list(text: &str) -> Vec<String> {
    let mut tasks: Vec<String> = ANSWER_LIST
        .captures_iter(text)
        .flat_map(|caps| split_list(&caps[1]))
        .collect();

    if tasks.is_empty() {
        tasks = ANY_LIST
            .find_iter(text)
            .find_map(|m| serde_json::from_str::<Vec<String>>(m.as_str()).ok())
            .unwrap_or_default();
    }

    tasks
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .take(MAX_TASKS)
        .collect()
}

fn split_list(inner: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<String>>(&format!("[{inner}]")) {
        Ok(items) => items,
        Err(_) => inner
            .split(", ")
            .map(|item| item.replace('"', ""))
            .collect(),
    }
}
