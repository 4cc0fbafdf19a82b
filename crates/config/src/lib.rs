//! Configuration loading, validation, and management for aiagent.
//!
//! Loads configuration from `~/.aiagent/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use aiagent_core::SamplingParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.aiagent/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Language model endpoint
    #[serde(default)]
    pub llm: LlmConfig,

    /// Agent loop behaviour
    #[serde(default)]
    pub agent: AgentSettings,

    /// Downstream services backing the built-in tools
    #[serde(default)]
    pub services: ServicesConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the text-generation-inference server
    #[serde(default = "default_llm_endpoint")]
    pub endpoint_url: String,

    /// Model identifier (informational; TGI serves a single model)
    #[serde(default = "default_model")]
    pub model: String,

    /// Optional bearer token for hosted endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Ceiling for a single model call
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Sampling parameters used by the agent loop
    #[serde(default)]
    pub sampling: SamplingParams,
}

fn default_llm_endpoint() -> String {
    "http://localhost:8080".into()
}
fn default_model() -> String {
    "Qwen/Qwen2.5-72B-Instruct".into()
}
fn default_llm_timeout() -> u64 {
    600
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint_url: default_llm_endpoint(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_llm_timeout(),
            sampling: SamplingParams::default(),
        }
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("model", &self.model)
            .field("api_key", &redact(&self.api_key))
            .field("timeout_secs", &self.timeout_secs)
            .field("sampling", &self.sampling)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Maximum planning ↔ tool dispatch cycles per request
    #[serde(default = "default_recursion_limit")]
    pub recursion_limit: u32,

    /// Language the planner and summarizer answer in
    #[serde(default = "default_language")]
    pub language: String,

    /// Tool catalog: a YAML file or a directory of YAML files.
    /// When unset, every built-in tool is registered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_catalog: Option<PathBuf>,
}

fn default_recursion_limit() -> u32 {
    5
}
fn default_language() -> String {
    "English".into()
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            recursion_limit: default_recursion_limit(),
            language: default_language(),
            tool_catalog: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tei_embedding_endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_retriever_endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieval_endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tei_reranking_endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_gen_endpoint: Option<String>,

    /// Attempts per downstream call before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause between attempts
    #[serde(default)]
    pub retry_backoff_ms: u64,

    /// Timeout for a single downstream HTTP call
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_max_attempts() -> u32 {
    5
}
fn default_request_timeout() -> u64 {
    60
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            tei_embedding_endpoint: None,
            web_retriever_endpoint: None,
            retrieval_endpoint: None,
            tei_reranking_endpoint: None,
            image_gen_endpoint: None,
            max_attempts: default_max_attempts(),
            retry_backoff_ms: 0,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    7071
}
fn default_host() -> String {
    "0.0.0.0".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.aiagent/config.toml),
    /// then apply environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"))
    }

    /// Load configuration from `path`, then apply environment variable overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment-like lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("LLM_ENDPOINT_URL") {
            self.llm.endpoint_url = url;
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(key) = lookup("LLM_API_KEY").or_else(|| lookup("HF_TOKEN")) {
            self.llm.api_key = Some(key);
        }
        if let Some(path) = lookup("TOOL_CATALOG_PATH") {
            self.agent.tool_catalog = Some(PathBuf::from(path));
        }
        if let Some(language) = lookup("AGENT_LANGUAGE") {
            self.agent.language = language;
        }
        if let Some(limit) = lookup("RECURSION_LIMIT") {
            self.agent.recursion_limit = parse_env("RECURSION_LIMIT", &limit)?;
        }
        if let Some(port) = lookup("PORT") {
            self.gateway.port = parse_env("PORT", &port)?;
        }

        let services = &mut self.services;
        for (key, slot) in [
            ("TEI_EMBEDDING_ENDPOINT", &mut services.tei_embedding_endpoint),
            ("WEB_RETRIEVER_ENDPOINT", &mut services.web_retriever_endpoint),
            ("RETRIEVAL_ENDPOINT", &mut services.retrieval_endpoint),
            ("TEI_RERANKING_ENDPOINT", &mut services.tei_reranking_endpoint),
            ("IMAGE_GEN_ENDPOINT", &mut services.image_gen_endpoint),
        ] {
            if let Some(value) = lookup(key) {
                *slot = Some(value);
            }
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".aiagent")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.recursion_limit == 0 {
            return Err(ConfigError::ValidationError(
                "agent.recursion_limit must be at least 1".into(),
            ));
        }

        let temperature = self.llm.sampling.temperature;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::ValidationError(
                "llm.sampling.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.services.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "services.max_attempts must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `aiagent config`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::ValidationError(format!("{key}: invalid value '{value}'")))
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
