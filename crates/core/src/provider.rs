//! Provider trait: the abstraction over the inference service.
//!
//! A Provider knows how to send a conversation plus a tool catalog to a
//! model and hand back the reply as a stream of fragments. A non-streamed
//! request is delivered as a single final fragment over the same channel.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::ProviderError;
use crate::message::Message;
use crate::tool::ToolCall;

/// A chat request sent to the inference service.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// The model identifier (e.g., "qwen3:14b")
    pub model: String,

    /// The full ordered conversation history
    pub messages: Vec<Message>,

    /// Tools the model may call
    pub tools: Vec<ToolSpec>,

    /// How long the service should keep the model loaded after this request
    pub keep_alive: Option<Duration>,

    /// Whether to stream the response incrementally
    pub stream: bool,
}

/// A tool description as advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema of the tool's arguments; `None` when it takes none
    pub parameters: Option<serde_json::Value>,
}

/// A single fragment of a streamed response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamChunk {
    /// Text delta
    pub content: Option<String>,

    /// Tool-call requests carried by this fragment
    pub tool_calls: Vec<ToolCall>,

    /// Whether this is the final fragment
    pub done: bool,
}

impl StreamChunk {
    /// A text-only fragment.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// A fragment carrying tool calls only.
    pub fn tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::default()
        }
    }
}

/// Receiving end of a response stream.
pub type ChunkReceiver = mpsc::Receiver<std::result::Result<StreamChunk, ProviderError>>;

/// The core Provider trait.
///
/// The agent loop calls `chat()` without knowing which backend is behind it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "ollama").
    fn name(&self) -> &str;

    /// Send a request and get the response as a stream of fragments.
    ///
    /// An `Err` here means the request never got a response. Failures after
    /// the response started arrive as `Err` items on the channel.
    async fn chat(&self, request: ChatRequest) -> std::result::Result<ChunkReceiver, ProviderError>;

    /// Can we reach the service?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_spec_serialization() {
        let spec = ToolSpec {
            name: "read_file".into(),
            description: "Read a file".into(),
            parameters: Some(serde_json::json!({
                "type": "object",
                "properties": { "path": { "type": "string" } },
                "required": ["path"]
            })),
        };
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("read_file"));
        assert!(json.contains("path"));
    }

    #[test]
    fn tool_spec_without_parameters_is_null() {
        let spec = ToolSpec {
            name: "current_dir".into(),
            description: "Show the current directory".into(),
            parameters: None,
        };
        let value = serde_json::to_value(&spec).unwrap();
        assert!(value["parameters"].is_null());
    }

    #[test]
    fn chunk_constructors() {
        let chunk = StreamChunk::text("hi");
        assert_eq!(chunk.content.as_deref(), Some("hi"));
        assert!(chunk.tool_calls.is_empty());
        assert!(!chunk.done);

        let chunk = StreamChunk::tool_calls(vec![ToolCall::new("get_time")]);
        assert!(chunk.content.is_none());
        assert_eq!(chunk.tool_calls.len(), 1);
    }
}
