//! HTTP endpoint tool — a catalog entry whose `callable_api` is a URL.
//!
//! The model's arguments are posted as a JSON object and the response body
//! is returned verbatim as the tool output.

use async_trait::async_trait;
use aiagent_core::error::ToolError;
use aiagent_core::tool::{ParameterSchema, Tool};
use tracing::{debug, warn};

pub struct HttpEndpointTool {
    name: String,
    description: String,
    parameters: ParameterSchema,
    url: String,
    client: reqwest::Client,
}

impl HttpEndpointTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ParameterSchema,
        url: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl Tool for HttpEndpointTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &ParameterSchema {
        &self.parameters
    }

    async fn invoke(
        &self,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Result<String, ToolError> {
        debug!(tool = %self.name, url = %self.url, "Calling tool endpoint");

        let failed = |reason: String| {
            warn!(tool = %self.name, error = %reason, "Tool endpoint failed");
            ToolError::ExecutionFailed {
                tool_name: self.name.clone(),
                reason,
            }
        };

        let response = self
            .client
            .post(&self.url)
            .json(&arguments)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| failed(e.to_string()))?;
        if !status.is_success() {
            return Err(failed(format!("HTTP {}: {}", status.as_u16(), body)));
        }

        Ok(body)
    }
}
