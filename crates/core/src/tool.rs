//! Tool definitions and the tool registry.
//!
//! Tools are what give the agent the ability to act in the world:
//! read files, list directories, fetch web pages, tell the time.
//! Each one is a [`ToolDefinition`]: a name, a description for the model,
//! an input schema derived from its input type, and a handler.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use schemars::JsonSchema;
use schemars::schema::RootSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dispatch::{ToolHandler, with_decoded_input};
use crate::error::{Error, ToolError};
use crate::provider::ToolSpec;
use crate::schema::input_schema;

/// A tool call's arguments: a string-keyed map of dynamic values.
pub type Arguments = serde_json::Map<String, serde_json::Value>;

/// A request, emitted by the model mid-stream, to run a named tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to execute
    pub name: String,

    /// Arguments, shaped by the named tool's schema
    #[serde(default)]
    pub arguments: Arguments,

    /// The arguments as sent, when they were not a JSON object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub malformed_arguments: Option<serde_json::Value>,
}

impl ToolCall {
    /// A call with no arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_arguments(name, Arguments::new())
    }

    pub fn with_arguments(name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            name: name.into(),
            arguments,
            malformed_arguments: None,
        }
    }

    /// A call with arguments exactly as the model produced them.
    ///
    /// Accepts an object, a string holding an object, or nothing at all.
    /// Anything else is kept verbatim and fails to decode when dispatched.
    pub fn from_raw(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        let parsed = match &arguments {
            serde_json::Value::Object(map) => Some(map.clone()),
            serde_json::Value::Null => Some(Arguments::new()),
            serde_json::Value::String(text) => serde_json::from_str(text).ok(),
            _ => None,
        };

        match parsed {
            Some(map) => Self::with_arguments(name, map),
            None => Self {
                name: name.into(),
                arguments: Arguments::new(),
                malformed_arguments: Some(arguments),
            },
        }
    }

    /// The arguments in the form they should be echoed back to the model.
    pub fn raw_arguments(&self) -> serde_json::Value {
        self.malformed_arguments
            .clone()
            .unwrap_or_else(|| serde_json::Value::Object(self.arguments.clone()))
    }
}

/// A registered capability.
#[derive(Clone)]
pub struct ToolDefinition {
    /// Unique name (the registry key)
    pub name: String,

    /// Natural-language description, shown to the model
    pub description: String,

    /// Argument schema; `None` if the tool takes no input
    pub input_schema: Option<RootSchema>,

    handler: Arc<dyn ToolHandler>,
}

impl ToolDefinition {
    /// Define a tool from a typed handler.
    ///
    /// The schema is generated from `T`, and incoming arguments are decoded
    /// into `T` before `handler` runs.
    pub fn new<T, F, Fut>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    where
        T: DeserializeOwned + JsonSchema + Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: input_schema::<T>(),
            handler: Arc::new(with_decoded_input(handler)),
        }
    }

    /// Run the handler for a call.
    pub async fn call(&self, call: &ToolCall) -> Result<String, ToolError> {
        self.handler.call(call).await
    }

    /// Describe this tool for the model.
    pub fn to_spec(&self) -> Result<ToolSpec, serde_json::Error> {
        let parameters = self
            .input_schema
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;
        Ok(ToolSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters,
        })
    }
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("has_schema", &self.input_schema.is_some())
            .finish()
    }
}

/// A registry of available tools.
///
/// Populated once at startup, then shared read-only (behind an `Arc`) with
/// the agent loop, which uses it to:
/// 1. Build the tool catalog sent with every request
/// 2. Resolve tool calls back to handlers
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolDefinition>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. The last registration for a name wins.
    pub fn register(&mut self, definition: ToolDefinition) {
        if let Some(previous) = self.tools.insert(definition.name.clone(), definition) {
            debug!(tool = %previous.name, "Replaced existing tool registration");
        }
    }

    /// Get a tool by name.
    pub fn lookup(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    /// All registered tools, in no particular order.
    pub fn all(&self) -> Vec<&ToolDefinition> {
        self.tools.values().collect()
    }

    /// Execute a tool call against the registry.
    pub async fn execute(&self, call: &ToolCall) -> Result<String, ToolError> {
        let tool = self
            .lookup(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
        tool.call(call).await
    }

    /// The catalog advertised to the model, reflecting current contents.
    pub fn catalog_for_model(&self) -> crate::Result<Vec<ToolSpec>> {
        self.tools
            .values()
            .map(|tool| tool.to_spec().map_err(Error::Serialization))
            .collect()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize, JsonSchema)]
    struct EchoInput {
        /// Text to echo back
        text: String,
    }

    #[derive(Deserialize, JsonSchema)]
    struct NoInput {}

    fn echo_tool() -> ToolDefinition {
        ToolDefinition::new("echo", "Echoes back the input", |input: EchoInput| async move {
            Ok(input.text)
        })
    }

    fn echo_call(text: &str) -> ToolCall {
        let arguments = json!({ "text": text }).as_object().cloned().unwrap();
        ToolCall::with_arguments("echo", arguments)
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_tool());
        assert!(registry.lookup("echo").is_some());
        assert!(registry.lookup("nonexistent").is_none());
    }

    #[test]
    fn last_registration_wins() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_tool());
        registry.register(ToolDefinition::new(
            "echo",
            "Replacement",
            |_: NoInput| async { Ok("replaced".to_string()) },
        ));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("echo").unwrap().description, "Replacement");
    }

    #[test]
    fn catalog_reflects_registry() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_tool());
        registry.register(ToolDefinition::new("noop", "Does nothing", |_: NoInput| async {
            Ok(String::new())
        }));

        let mut catalog = registry.catalog_for_model().unwrap();
        catalog.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].name, "echo");
        let params = catalog[0].parameters.as_ref().unwrap();
        assert_eq!(params["properties"]["text"]["description"], "Text to echo back");
        assert_eq!(params["additionalProperties"], false);
        assert_eq!(catalog[1].name, "noop");
        assert!(catalog[1].parameters.is_none());
    }

    #[tokio::test]
    async fn registry_execute_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_tool());
        let result = registry.execute(&echo_call("hello world")).await.unwrap();
        assert_eq!(result, "hello world");
    }

    #[tokio::test]
    async fn registry_execute_missing_tool() {
        let registry = ToolRegistry::new();
        let err = registry.execute(&ToolCall::new("nonexistent")).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn registry_execute_bad_arguments() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_tool());
        let err = registry.execute(&ToolCall::new("echo")).await.unwrap_err();
        assert!(matches!(err, ToolError::Decode(_)));
    }

    #[test]
    fn raw_arguments_object_or_json_string() {
        let from_object = ToolCall::from_raw("echo", json!({"text": "hi"}));
        let from_string = ToolCall::from_raw("echo", json!("{\"text\": \"hi\"}"));
        assert_eq!(from_object, from_string);
        assert_eq!(from_object.arguments["text"], "hi");
        assert!(from_object.malformed_arguments.is_none());
        assert!(ToolCall::from_raw("get_time", serde_json::Value::Null).arguments.is_empty());
    }

    #[test]
    fn raw_arguments_not_an_object_are_kept() {
        for raw in [json!("{\"text\": \"hi\""), json!(["hi"]), json!(7), json!("[1]")] {
            let call = ToolCall::from_raw("echo", raw.clone());
            assert!(call.arguments.is_empty());
            assert_eq!(call.malformed_arguments.as_ref(), Some(&raw));
            assert_eq!(call.raw_arguments(), raw);
        }
    }

    #[tokio::test]
    async fn registry_execute_malformed_arguments() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_tool());
        let call = ToolCall::from_raw("echo", json!("{\"text\": \"hi\""));
        match registry.execute(&call).await.unwrap_err() {
            ToolError::Decode(e) => {
                assert_eq!(e.field, None);
                assert!(e.message.starts_with("not a JSON object"), "{}", e.message);
                assert!(!e.message.contains("line"), "{}", e.message);
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn tool_call_deserializes_without_arguments() {
        let call: ToolCall = serde_json::from_str(r#"{"name":"get_time"}"#).unwrap();
        assert!(call.arguments.is_empty());
    }
}
