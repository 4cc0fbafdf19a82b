//! Web search tool — embeds the query and asks the web retriever service
//! for the closest pages.
//!
//! The retriever returns documents whose text carries `title:` and
//! `source:` lines; the agent's dispatcher lifts those into source
//! references for tools whose name mentions `web`.

use std::sync::Arc;

use async_trait::async_trait;
use aiagent_core::error::ToolError;
use aiagent_core::tool::{ParamSpec, ParameterSchema, Tool};
use tracing::debug;

use crate::required_str;
use crate::services::Services;

pub struct WebSearchTool {
    services: Arc<Services>,
    parameters: ParameterSchema,
}

impl WebSearchTool {
    pub fn new(services: Arc<Services>) -> Self {
        let mut parameters = ParameterSchema::new();
        parameters.insert("query".into(), ParamSpec::new("str", "The search query"));
        Self {
            services,
            parameters,
        }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search from web for a specific query."
    }

    fn parameters(&self) -> &ParameterSchema {
        &self.parameters
    }

    async fn invoke(
        &self,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Result<String, ToolError> {
        let query = required_str(&arguments, "query")?;

        let embedding = self.services.embed(query).await?;
        let docs = self.services.web_retrieve(query, &embedding).await?;
        debug!(query, docs = docs.len(), "Web search complete");

        Ok(docs
            .into_iter()
            .map(|doc| doc.text)
            .collect::<Vec<_>>()
            .join(" "))
    }
}
