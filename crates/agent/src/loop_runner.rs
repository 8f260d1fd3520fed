//! The conversation loop.
//!
//! One exchange runs `StreamingResponse → DispatchingTools → StreamingResponse …`
//! until a response requests no tools, then control returns to the user.
//! Everything that happens is reported to an [`EventSink`].
//!
//! Input lines are matched against the commands after trimming. A line that
//! is empty or only whitespace is ignored rather than sent as a user turn.

use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};
use yaa_core::error::ToolError;
use yaa_core::message::{Message, Role};
use yaa_core::provider::{ChatRequest, Provider, ToolSpec};
use yaa_core::tool::{ToolCall, ToolRegistry};

use crate::stream_event::{AgentStreamEvent, EventSink};
use crate::stream_processor::StreamProcessor;

/// Resets history to the baseline.
pub const CLEAR_COMMAND: &str = "!clear";

/// Re-issues the last user turn.
pub const RETRY_COMMAND: &str = "!retry";

/// Tool message content when the model asks for a tool that doesn't exist.
pub const TOOL_NOT_FOUND: &str = "error: tool not found";

/// Where the loop goes next.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopState {
    AwaitingUserInput,
    StreamingResponse,
    DispatchingTools(Vec<ToolCall>),
}

/// Owns the conversation history and drives exchanges with the model.
pub struct AgentLoop {
    /// The inference service
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    /// Tool registry, read-only once the loop exists
    tools: Arc<ToolRegistry>,

    /// Catalog advertised with every request
    catalog: Vec<ToolSpec>,

    /// How long the service keeps the model loaded
    keep_alive: Option<Duration>,

    /// Hide text until the reasoning-end marker
    hide_reasoning: bool,

    /// What `!clear` restores
    baseline: Vec<Message>,

    history: Vec<Message>,
}

impl AgentLoop {
    /// Create a new agent loop.
    ///
    /// Fails if the registry's catalog cannot be serialized.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
    ) -> yaa_core::Result<Self> {
        let catalog = tools.catalog_for_model()?;

        Ok(Self {
            provider,
            model: model.into(),
            tools,
            catalog,
            keep_alive: None,
            hide_reasoning: true,
            baseline: Vec::new(),
            history: Vec::new(),
        })
    }

    /// Start the conversation with a system prompt. Empty means none.
    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.baseline = prompt
            .filter(|p| !p.is_empty())
            .map(Message::system)
            .into_iter()
            .collect();
        self.history = self.baseline.clone();
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = Some(keep_alive);
        self
    }

    pub fn with_reasoning_hidden(mut self, hidden: bool) -> Self {
        self.hide_reasoning = hidden;
        self
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Read user lines until the input closes.
    pub async fn run<L, S>(&mut self, mut lines: L, sink: &mut S)
    where
        L: Stream<Item = String> + Unpin,
        S: EventSink + ?Sized,
    {
        loop {
            sink.emit(AgentStreamEvent::InputRequested);
            let Some(line) = lines.next().await else {
                info!("Input closed, ending conversation");
                return;
            };

            if self.handle_input(&line) == LoopState::StreamingResponse {
                self.respond(sink).await;
            }
        }
    }

    /// Apply one line of user input to the history.
    ///
    /// Returns `StreamingResponse` when the model should be queried.
    pub fn handle_input(&mut self, line: &str) -> LoopState {
        match line.trim() {
            "" => LoopState::AwaitingUserInput,
            CLEAR_COMMAND => {
                self.clear();
                LoopState::AwaitingUserInput
            }
            RETRY_COMMAND => {
                if self.retry() {
                    LoopState::StreamingResponse
                } else {
                    LoopState::AwaitingUserInput
                }
            }
            _ => {
                self.history.push(Message::user(line));
                LoopState::StreamingResponse
            }
        }
    }

    /// Reset history to the baseline.
    pub fn clear(&mut self) {
        info!(
            dropped = self.history.len().saturating_sub(self.baseline.len()),
            "History cleared"
        );
        self.history = self.baseline.clone();
    }

    /// Drop everything after the most recent user message.
    ///
    /// Returns false, leaving history untouched, when there is no user message.
    pub fn retry(&mut self) -> bool {
        match self.history.iter().rposition(|m| m.role == Role::User) {
            Some(idx) => {
                self.history.truncate(idx + 1);
                debug!(messages = self.history.len(), "Retrying last user message");
                true
            }
            None => {
                debug!("Nothing to retry");
                false
            }
        }
    }

    /// Run one exchange: stream, dispatch tools, repeat until no tools are requested.
    pub async fn respond<S>(&mut self, sink: &mut S)
    where
        S: EventSink + ?Sized,
    {
        let mut state = LoopState::StreamingResponse;
        loop {
            state = match state {
                LoopState::AwaitingUserInput => return,
                LoopState::StreamingResponse => self.stream_response(sink).await,
                LoopState::DispatchingTools(calls) => self.dispatch_tools(calls, sink).await,
            };
        }
    }

    /// Send the history and catalog, process the streamed reply, and record it.
    pub async fn stream_response<S>(&mut self, sink: &mut S) -> LoopState
    where
        S: EventSink + ?Sized,
    {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: self.history.clone(),
            tools: self.catalog.clone(),
            keep_alive: self.keep_alive,
            stream: true,
        };

        debug!(
            provider = self.provider.name(),
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Requesting response"
        );

        let mut rx = match self.provider.chat(request).await {
            Ok(rx) => rx,
            Err(e) => {
                warn!(error = %e, "Chat request failed");
                sink.emit(AgentStreamEvent::Error {
                    message: e.to_string(),
                });
                return LoopState::AwaitingUserInput;
            }
        };

        let mut processor = StreamProcessor::with_reasoning_hidden(self.hide_reasoning);
        while let Some(item) = rx.recv().await {
            match item {
                Ok(chunk) => {
                    let done = chunk.done;
                    if let Some(content) = processor.feed(chunk) {
                        sink.emit(AgentStreamEvent::Chunk { content });
                    }
                    if done {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Response stream failed");
                    sink.emit(AgentStreamEvent::ResponseDone {
                        spoke: processor.spoke(),
                    });
                    sink.emit(AgentStreamEvent::Error {
                        message: e.to_string(),
                    });
                    return LoopState::AwaitingUserInput;
                }
            }
        }

        let outcome = processor.finish();
        sink.emit(AgentStreamEvent::ResponseDone {
            spoke: outcome.spoke,
        });

        debug!(
            raw_len = outcome.raw_text.len(),
            tool_calls = outcome.tool_calls.len(),
            "Response complete"
        );

        self.history.push(Message::assistant_with_tool_calls(
            outcome.raw_text,
            outcome.tool_calls.clone(),
        ));

        if outcome.tool_calls.is_empty() {
            LoopState::AwaitingUserInput
        } else {
            LoopState::DispatchingTools(outcome.tool_calls)
        }
    }

    /// Run requested tools in order, appending one tool message per call.
    pub async fn dispatch_tools<S>(&mut self, calls: Vec<ToolCall>, sink: &mut S) -> LoopState
    where
        S: EventSink + ?Sized,
    {
        for call in calls {
            sink.emit(AgentStreamEvent::ToolCall {
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            });

            let content = match self.tools.execute(&call).await {
                Ok(output) => {
                    debug!(tool = %call.name, bytes = output.len(), "Tool succeeded");
                    sink.emit(AgentStreamEvent::ToolResult {
                        name: call.name.clone(),
                        bytes: output.len(),
                    });
                    output
                }
                Err(ToolError::NotFound(_)) => {
                    warn!(tool = %call.name, "Model requested unknown tool");
                    sink.emit(AgentStreamEvent::ToolFailed {
                        name: call.name.clone(),
                        error: "not found".into(),
                    });
                    TOOL_NOT_FOUND.to_string()
                }
                Err(e) => {
                    warn!(tool = %call.name, error = %e, "Tool execution failed");
                    sink.emit(AgentStreamEvent::ToolFailed {
                        name: call.name.clone(),
                        error: e.to_string(),
                    });
                    format!("error: {e}")
                }
            };

            self.history.push(Message::tool_result(content));
        }

        LoopState::StreamingResponse
    }
}
