//! The conversation loop for yaa.
//!
//! One exchange works like this:
//!
//! 1. **Send** the full history and the tool catalog to the model
//! 2. **Stream** the reply, hiding the reasoning segment and collecting tool calls
//! 3. **Record** the reply (reasoning included) as an assistant message
//! 4. **If tool calls**: run them in order, append their results, go back to step 1
//! 5. **Otherwise**: wait for the next user line
//!
//! `!clear` and `!retry` edit the history between exchanges.

pub mod loop_runner;
pub mod query;
pub mod stream_event;
pub mod stream_processor;

pub use loop_runner::{AgentLoop, CLEAR_COMMAND, LoopState, RETRY_COMMAND, TOOL_NOT_FOUND};
pub use query::{AgentIdentity, DEFAULT_AGENT_NAME, probe_identity, query_structured};
pub use stream_event::{AgentStreamEvent, EventSink};
pub use stream_processor::{REASONING_END_MARKER, StreamOutcome, StreamProcessor, strip_reasoning};
