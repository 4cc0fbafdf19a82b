//! Knowledge base tool — retrieval-augmented lookup over the local
//! document store.
//!
//! Pipeline: embed the query, pull candidates from the vector store, rerank
//! them, and hand the best few back to the model as plain text.

use std::sync::Arc;

use async_trait::async_trait;
use aiagent_core::error::ToolError;
use aiagent_core::tool::{ParamSpec, ParameterSchema, Tool};
use tracing::debug;

use crate::required_str;
use crate::services::Services;

/// Appended to every non-empty answer so the model stops re-querying.
const RETRIEVED_NOTICE: &str =
    "The relevant content has already been retrieved and updated in the previous system message.";

pub struct KnowledgeBaseTool {
    services: Arc<Services>,
    parameters: ParameterSchema,
}

impl KnowledgeBaseTool {
    pub fn new(services: Arc<Services>) -> Self {
        let mut parameters = ParameterSchema::new();
        parameters.insert(
            "query".into(),
            ParamSpec::new("str", "What to look up in the knowledge base"),
        );
        Self {
            services,
            parameters,
        }
    }
}

#[async_trait]
impl Tool for KnowledgeBaseTool {
    fn name(&self) -> &str {
        "search_knowledge_base"
    }

    fn description(&self) -> &str {
        "Search from files/local database for a specific query."
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
        let candidates: Vec<String> = self
            .services
            .retrieve(query, &embedding)
            .await?
            .into_iter()
            .map(|doc| doc.text)
            .collect();

        if candidates.is_empty() {
            debug!(query, "Knowledge base returned no documents");
            return Ok("No relevant content was found in the knowledge base.".into());
        }

        let best = self.services.rerank(query, &candidates).await?;
        debug!(query, candidates = candidates.len(), kept = best.len(), "Knowledge base lookup complete");

        Ok(format!("{}\n{}", best.join("\n"), RETRIEVED_NOTICE))
    }
}
