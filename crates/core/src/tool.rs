//! Tool trait — the abstraction over agent capabilities.
//!
//! Tools are what give the agent the ability to act in the world:
//! search the web, query a knowledge base, generate images, call a
//! configured HTTP endpoint.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::error::ToolError;

/// Declared type and description of a single tool argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub description: String,
}

impl ParamSpec {
    pub fn new(kind: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            description: description.into(),
        }
    }
}

/// Ordered argument schema: argument name → spec.
pub type ParameterSchema = IndexMap<String, ParamSpec>;

/// A serializable view of a tool for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: ParameterSchema,
}

/// The core Tool trait.
///
/// Each tool (web search, knowledge base, image generation, HTTP endpoint)
/// implements this trait. Tools are registered in the ToolRegistry once at
/// startup and are immutable afterwards.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "web_search").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// Ordered argument schema.
    fn parameters(&self) -> &ParameterSchema;

    /// Execute the tool and return its textual result.
    async fn invoke(
        &self,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> std::result::Result<String, ToolError>;

    /// Convert this tool into a ToolDefinition.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters().clone(),
        }
    }
}

/// A registry of available tools.
///
/// The agent loop uses this to:
/// 1. Render the tool catalog into the prompt
/// 2. Look up and execute tools when the model requests them
///
/// Registration order is preserved so the rendered catalog is deterministic.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a tool. Fails if a tool with the same name already exists.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> std::result::Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(ToolError::Duplicate(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Get a tool by name.
    pub fn lookup(&self, name: &str) -> std::result::Result<&dyn Tool, ToolError> {
        self.index
            .get(name)
            .map(|&i| self.tools[i].as_ref())
            .ok_or_else(|| ToolError::NotFound(name.to_string()))
    }

    /// Render the catalog for the prompt, one tool per line.
    ///
    /// Shape: `<name> - <description>, args: [{'name': .., 'type': .., 'description': .., 'required': True}, ...]`.
    pub fn describe_all(&self) -> String {
        self.tools
            .iter()
            .map(|t| describe(t.as_ref()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Get all tool definitions (for listings).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// List all registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn describe(tool: &dyn Tool) -> String {
    let args = tool
        .parameters()
        .iter()
        .map(|(name, spec)| {
            format!(
                "{{'name': {}, 'type': {}, 'description': {}, 'required': True}}",
                quote(name),
                quote(&spec.kind),
                quote(&spec.description)
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("{} - {}, args: [{}]", tool.name(), tool.description(), args)
}

/// Quote a string literal the way Python's `repr` does: single quotes unless
/// the text holds a `'` and no `"`, with backslash escapes for the rest.
fn quote(text: &str) -> String {
    let delim = if text.contains('\'') && !text.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(text.len() + 2);
    out.push(delim);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delim);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple test tool for unit tests.
    struct EchoTool {
        name: &'static str,
        params: ParameterSchema,
    }

    impl EchoTool {
        fn new(name: &'static str) -> Self {
            let mut params = ParameterSchema::new();
            params.insert("text".into(), ParamSpec::new("str", "text to echo"));
            params.insert("times".into(), ParamSpec::new("int", "repeat count"));
            Self { name, params }
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        fn parameters(&self) -> &ParameterSchema {
            &self.params
        }
        async fn invoke(
            &self,
            arguments: serde_json::Map<String, serde_json::Value>,
        ) -> std::result::Result<String, ToolError> {
            Ok(arguments["text"].as_str().unwrap_or("").to_string())
        }
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool::new("echo"))).unwrap();
        assert!(registry.lookup("echo").is_ok());
        assert!(matches!(
            registry.lookup("nonexistent"),
            Err(ToolError::NotFound(name)) if name == "nonexistent"
        ));
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool::new("echo"))).unwrap();
        let err = registry.register(Box::new(EchoTool::new("echo"))).unwrap_err();
        assert!(matches!(err, ToolError::Duplicate(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn describe_all_preserves_order_and_shape() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool::new("zeta"))).unwrap();
        registry.register(Box::new(EchoTool::new("alpha"))).unwrap();

        let rendered = registry.describe_all();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "zeta - Echoes back the input, args: [\
             {'name': 'text', 'type': 'str', 'description': 'text to echo', 'required': True}, \
             {'name': 'times', 'type': 'int', 'description': 'repeat count', 'required': True}]"
        );
        assert!(lines[1].starts_with("alpha - "));
        assert_eq!(registry.names(), vec!["zeta", "alpha"]);
    }

    #[test]
    fn empty_registry_renders_nothing() {
        assert_eq!(ToolRegistry::new().describe_all(), "");
    }

    #[test]
    fn describe_keeps_quotes_balanced() {
        let mut params = ParameterSchema::new();
        params.insert("city".into(), ParamSpec::new("str", "the user's city"));
        params.insert("note".into(), ParamSpec::new("str", r#"it's a "quoted" word"#));
        let tool = EchoTool { name: "weather", params };

        assert_eq!(
            describe(&tool),
            "weather - Echoes back the input, args: [\
             {'name': 'city', 'type': 'str', 'description': \"the user's city\", 'required': True}, \
             {'name': 'note', 'type': 'str', 'description': 'it\\'s a \"quoted\" word', 'required': True}]"
        );
    }

    #[tokio::test]
    async fn lookup_then_invoke() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool::new("echo"))).unwrap();

        let mut args = serde_json::Map::new();
        args.insert("text".into(), serde_json::json!("hello world"));
        let output = registry.lookup("echo").unwrap().invoke(args).await.unwrap();
        assert_eq!(output, "hello world");
    }

    #[test]
    fn definitions_carry_schema() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool::new("echo"))).unwrap();
        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].parameters["times"].kind, "int");
    }
}
