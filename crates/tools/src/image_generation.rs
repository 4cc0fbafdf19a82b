//! Image generation tool — text-to-image through the image service.

use std::sync::Arc;

use async_trait::async_trait;
use aiagent_core::error::ToolError;
use aiagent_core::tool::{ParamSpec, ParameterSchema, Tool};

use crate::required_str;
use crate::services::Services;

pub struct ImageGenerationTool {
    services: Arc<Services>,
    parameters: ParameterSchema,
}

impl ImageGenerationTool {
    pub fn new(services: Arc<Services>) -> Self {
        let mut parameters = ParameterSchema::new();
        parameters.insert(
            "prompt".into(),
            ParamSpec::new("str", "Description of the image to generate"),
        );
        Self {
            services,
            parameters,
        }
    }
}

#[async_trait]
impl Tool for ImageGenerationTool {
    fn name(&self) -> &str {
        "image_generation"
    }

    fn description(&self) -> &str {
        "Generate an image from a text prompt. Returns the URL of the generated image."
    }

    fn parameters(&self) -> &ParameterSchema {
        &self.parameters
    }

    async fn invoke(
        &self,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Result<String, ToolError> {
        let prompt = required_str(&arguments, "prompt")?;
        self.services.text_to_image(prompt).await
    }
}
