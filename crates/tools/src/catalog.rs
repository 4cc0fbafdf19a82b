//! YAML tool catalog.
//!
//! A catalog is a YAML file (or a directory of `*.yaml` files) whose
//! top-level keys are tool names:
//!
//! ```yaml
//! web_search:
//!   description: Search from web for a specific query.
//!   callable_api: tools.py:web_search_retriever
//!   args_schema:
//!     query:
//!       type: str
//!       description: the search query
//!
//! weather:
//!   description: Current weather for a city.
//!   callable_api: http://weather.internal:8080/v1/current
//!   args_schema:
//!     query:
//!       type: str
//!       description: city name
//! ```
//!
//! `callable_api` is either an `http(s)://` endpoint or a reference to one
//! of the built-in tools. Endpoint tools must declare `description` and
//! `args_schema`; built-ins describe themselves when those are omitted.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use aiagent_core::error::ToolError;
use aiagent_core::tool::{ParameterSchema, Tool, ToolRegistry};
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, info};

use crate::http_endpoint::HttpEndpointTool;
use crate::image_generation::ImageGenerationTool;
use crate::knowledge_base::KnowledgeBaseTool;
use crate::services::Services;
use crate::web_search::WebSearchTool;

/// One catalog entry, as written in YAML.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolEntry {
    pub callable_api: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub args_schema: Option<ParameterSchema>,
}

/// Errors raised while loading a tool catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read tool catalog at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse tool catalog at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Tool {tool} is missing '{field}' in the tool setting")]
    MissingField { tool: String, field: &'static str },

    #[error("Tool {tool} refers to unknown built-in '{reference}'")]
    UnknownBuiltin { tool: String, reference: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error(transparent)]
    Registry(#[from] ToolError),
}

/// Built-in tools a catalog entry can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    WebSearch,
    KnowledgeBase,
    ImageGeneration,
}

impl Builtin {
    /// Resolve a `callable_api` reference such as `tools.py:web_search_retriever`,
    /// `tools.web_search_retriever` or just `web_search`.
    pub fn resolve(reference: &str) -> Option<Self> {
        let name = match reference.rsplit_once(':') {
            Some((_, func)) => func,
            None => reference.rsplit('.').next().unwrap_or(reference),
        };
        match name.trim() {
            "web_search_retriever" | "web_search" => Some(Self::WebSearch),
            "rag_retriever" | "search_knowledge_base" | "knowledge_base" => {
                Some(Self::KnowledgeBase)
            }
            "image_generation" => Some(Self::ImageGeneration),
            _ => None,
        }
    }

    pub fn build(self, services: Arc<Services>) -> Box<dyn Tool> {
        match self {
            Self::WebSearch => Box::new(WebSearchTool::new(services)),
            Self::KnowledgeBase => Box::new(KnowledgeBaseTool::new(services)),
            Self::ImageGeneration => Box::new(ImageGenerationTool::new(services)),
        }
    }
}

/// A built-in tool exposed under the catalog's name, with the catalog's
/// description and schema when given.
pub struct ConfiguredTool {
    name: String,
    description: String,
    parameters: ParameterSchema,
    inner: Box<dyn Tool>,
}

impl ConfiguredTool {
    fn new(name: String, entry: &ToolEntry, inner: Box<dyn Tool>) -> Self {
        Self {
            description: entry
                .description
                .clone()
                .unwrap_or_else(|| inner.description().to_string()),
            parameters: entry
                .args_schema
                .clone()
                .unwrap_or_else(|| inner.parameters().clone()),
            name,
            inner,
        }
    }
}

#[async_trait]
impl Tool for ConfiguredTool {
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
        self.inner.invoke(arguments).await
    }
}

/// Load a catalog file or directory into a fresh registry.
pub fn load(path: &Path, services: Arc<Services>) -> Result<ToolRegistry, CatalogError> {
    let mut registry = ToolRegistry::new();
    for file in catalog_files(path)? {
        let content = std::fs::read_to_string(&file).map_err(|source| CatalogError::Io {
            path: file.clone(),
            source,
        })?;
        let entries = parse(&content).map_err(|source| CatalogError::Parse {
            path: file.clone(),
            source,
        })?;
        debug!(path = %file.display(), tools = entries.len(), "Parsed tool catalog");

        for (name, entry) in entries {
            registry.register(build_tool(name, &entry, &services)?)?;
        }
    }

    info!(path = %path.display(), tools = registry.len(), "Tool catalog loaded");
    Ok(registry)
}

/// Parse catalog YAML, preserving entry order. An empty document yields no tools.
pub fn parse(content: &str) -> Result<IndexMap<String, ToolEntry>, serde_yaml::Error> {
    let entries: Option<IndexMap<String, ToolEntry>> = serde_yaml::from_str(content)?;
    Ok(entries.unwrap_or_default())
}

/// Turn one catalog entry into a tool.
pub fn build_tool(
    name: String,
    entry: &ToolEntry,
    services: &Arc<Services>,
) -> Result<Box<dyn Tool>, CatalogError> {
    let api = entry.callable_api.trim();

    if api.starts_with("http://") || api.starts_with("https://") {
        let description = entry
            .description
            .clone()
            .ok_or_else(|| CatalogError::MissingField {
                tool: name.clone(),
                field: "description",
            })?;
        let parameters = entry
            .args_schema
            .clone()
            .ok_or_else(|| CatalogError::MissingField {
                tool: name.clone(),
                field: "args_schema",
            })?;
        return Ok(Box::new(HttpEndpointTool::new(
            name,
            description,
            parameters,
            api,
            services.http_client(),
        )));
    }

    let builtin = Builtin::resolve(api).ok_or_else(|| CatalogError::UnknownBuiltin {
        tool: name.clone(),
        reference: api.to_string(),
    })?;
    Ok(Box::new(ConfiguredTool::new(
        name,
        entry,
        builtin.build(services.clone()),
    )))
}

fn catalog_files(path: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let read_dir = std::fs::read_dir(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = read_dir
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "yaml"))
        .collect();
    files.sort();
    Ok(files)
}
