//! Streaming response processor.
//!
//! Consumes response fragments one at a time, keeps the full raw text for
//! history, hides everything up to the reasoning-end marker, and collects
//! tool-call requests in arrival order.
//!
//! Marker detection runs on the cumulative text, so a marker split across
//! any number of fragments is still found.

use yaa_core::provider::StreamChunk;
use yaa_core::tool::ToolCall;

/// Literal that closes the model's reasoning segment.
pub const REASONING_END_MARKER: &str = "</think>";

/// Per-stream state, advanced by [`StreamProcessor::feed`].
#[derive(Debug, Clone)]
pub struct StreamProcessor {
    raw: String,
    visible: String,
    reasoning_phase: bool,
    pending_tool_calls: Vec<ToolCall>,
}

/// What a finished stream produced.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamOutcome {
    /// Every text delta concatenated, reasoning included
    pub raw_text: String,

    /// Text shown to the user
    pub visible_text: String,

    /// Tool calls in the order the model emitted them
    pub tool_calls: Vec<ToolCall>,

    /// Whether any visible text was produced
    pub spoke: bool,
}

impl StreamProcessor {
    /// A processor that hides text until the reasoning-end marker arrives.
    pub fn new() -> Self {
        Self::with_reasoning_hidden(true)
    }

    /// A processor that shows text from the first fragment.
    pub fn without_reasoning() -> Self {
        Self::with_reasoning_hidden(false)
    }

    pub fn with_reasoning_hidden(hidden: bool) -> Self {
        Self {
            raw: String::new(),
            visible: String::new(),
            reasoning_phase: hidden,
            pending_tool_calls: Vec::new(),
        }
    }

    /// Advance the state by one fragment.
    ///
    /// Returns the newly visible text, if this fragment produced any.
    pub fn feed(&mut self, chunk: StreamChunk) -> Option<String> {
        self.pending_tool_calls.extend(chunk.tool_calls);

        let delta = chunk.content.filter(|c| !c.is_empty())?;
        let start = self.raw.len();
        self.raw.push_str(&delta);

        let visible_from = if self.reasoning_phase {
            let marker_end = self.find_marker_end(start)?;
            self.reasoning_phase = false;
            marker_end
        } else {
            start
        };

        let visible = &self.raw[visible_from..];
        if visible.is_empty() {
            return None;
        }

        self.visible.push_str(visible);
        Some(visible.to_string())
    }

    /// Byte offset just past the marker, searching only where a marker
    /// completed by the delta starting at `start` could begin.
    fn find_marker_end(&self, start: usize) -> Option<usize> {
        let mut from = start.saturating_sub(REASONING_END_MARKER.len() - 1);
        while !self.raw.is_char_boundary(from) {
            from -= 1;
        }

        self.raw[from..]
            .find(REASONING_END_MARKER)
            .map(|idx| from + idx + REASONING_END_MARKER.len())
    }

    pub fn in_reasoning(&self) -> bool {
        self.reasoning_phase
    }

    pub fn spoke(&self) -> bool {
        !self.visible.is_empty()
    }

    pub fn raw_text(&self) -> &str {
        &self.raw
    }

    pub fn pending_tool_calls(&self) -> &[ToolCall] {
        &self.pending_tool_calls
    }

    pub fn finish(self) -> StreamOutcome {
        StreamOutcome {
            spoke: !self.visible.is_empty(),
            raw_text: self.raw,
            visible_text: self.visible,
            tool_calls: self.pending_tool_calls,
        }
    }
}

impl Default for StreamProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything after the last reasoning-end marker, or the whole text.
pub fn strip_reasoning(text: &str) -> &str {
    match text.rfind(REASONING_END_MARKER) {
        Some(idx) => &text[idx + REASONING_END_MARKER.len()..],
        None => text,
    }
}
