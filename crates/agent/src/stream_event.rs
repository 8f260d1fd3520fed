//! Agent-level events.
//!
//! `AgentStreamEvent` is how the conversation loop reports progress to
//! whatever presents the transcript: the terminal renderer in the binary,
//! or a recording closure in tests.

use serde::{Deserialize, Serialize};
use yaa_core::tool::Arguments;

/// Events emitted by the agent while it runs.
///
/// - `input_requested`: the loop is waiting for the next user line
/// - `chunk`: newly visible response text
/// - `response_done`: a response stream ended
/// - `tool_call`: a requested tool is about to run
/// - `tool_result`: the tool produced output
/// - `tool_failed`: the tool was missing or returned an error
/// - `error`: the request to the inference service failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentStreamEvent {
    InputRequested,

    /// Text to display, exactly as the model produced it.
    Chunk { content: String },

    /// `spoke` is true when the response showed any text.
    ResponseDone { spoke: bool },

    ToolCall { name: String, arguments: Arguments },

    ToolResult { name: String, bytes: usize },

    ToolFailed { name: String, error: String },

    Error { message: String },
}

impl AgentStreamEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::InputRequested => "input_requested",
            Self::Chunk { .. } => "chunk",
            Self::ResponseDone { .. } => "response_done",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::ToolFailed { .. } => "tool_failed",
            Self::Error { .. } => "error",
        }
    }
}

/// Receives agent events as they happen.
pub trait EventSink {
    fn emit(&mut self, event: AgentStreamEvent);
}

impl<F> EventSink for F
where
    F: FnMut(AgentStreamEvent),
{
    fn emit(&mut self, event: AgentStreamEvent) {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization_chunk() {
        let event = AgentStreamEvent::Chunk {
            content: "Hello".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"chunk""#));
        assert!(json.contains(r#""content":"Hello""#));
    }

    #[test]
    fn event_serialization_tool_call() {
        let event = AgentStreamEvent::ToolCall {
            name: "read_file".into(),
            arguments: serde_json::json!({"path": "a.txt"})
                .as_object()
                .cloned()
                .unwrap(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"tool_call""#));
        assert!(json.contains(r#""path":"a.txt""#));
    }

    #[test]
    fn event_type_names() {
        assert_eq!(AgentStreamEvent::InputRequested.event_type(), "input_requested");
        assert_eq!(
            AgentStreamEvent::ResponseDone { spoke: false }.event_type(),
            "response_done"
        );
        assert_eq!(
            AgentStreamEvent::ToolFailed {
                name: "x".into(),
                error: "boom".into()
            }
            .event_type(),
            "tool_failed"
        );
    }

    #[test]
    fn closures_are_sinks() {
        let mut seen = Vec::new();
        {
            let mut sink = |event: AgentStreamEvent| seen.push(event);
            sink.emit(AgentStreamEvent::InputRequested);
            sink.emit(AgentStreamEvent::Error {
                message: "boom".into(),
            });
        }
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].event_type(), "error");
    }
}
