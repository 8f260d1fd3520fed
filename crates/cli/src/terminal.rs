//! ANSI transcript renderer.

use std::io::{self, Stdout, Write};

use tracing::warn;
use yaa_agent::{AgentStreamEvent, EventSink};

const GREEN: &str = "\x1b[92m";
const YELLOW: &str = "\x1b[93m";
const BLUE: &str = "\x1b[94m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";
const CLEAR_LINE: &str = "\x1b[2K\r";

/// Renders agent events as a role-labeled transcript.
pub struct Terminal<W: Write> {
    out: W,
    agent_name: String,
    /// Whether the current response has printed its label yet
    speaking: bool,
}

impl Terminal<Stdout> {
    pub fn stdout(agent_name: impl Into<String>) -> Self {
        Self::new(io::stdout(), agent_name)
    }
}

impl<W: Write> Terminal<W> {
    pub fn new(out: W, agent_name: impl Into<String>) -> Self {
        Self {
            out,
            agent_name: agent_name.into(),
            speaking: false,
        }
    }

    pub fn set_agent_name(&mut self, name: impl Into<String>) {
        self.agent_name = name.into();
    }

    /// Shown while the identity probe runs.
    pub fn preparing(&mut self) -> io::Result<()> {
        write!(self.out, "{GREEN}YAA{RESET}: Getting the agent ready... ")?;
        self.out.flush()
    }

    pub fn clear_line(&mut self) -> io::Result<()> {
        write!(self.out, "{CLEAR_LINE}")?;
        self.out.flush()
    }

    pub fn banner(&mut self, model: &str, user_agent: Option<&str>) -> io::Result<()> {
        writeln!(
            self.out,
            "{GREEN}YAA{RESET}: Name: {} | Model: {model} | UA: {}",
            self.agent_name,
            user_agent.unwrap_or_default()
        )?;
        writeln!(
            self.out,
            "{GREEN}YAA{RESET}: Reset history with !clear, retry last prompt with !retry"
        )?;
        writeln!(self.out)?;
        self.out.flush()
    }

    fn render(&mut self, event: AgentStreamEvent) -> io::Result<()> {
        match event {
            AgentStreamEvent::InputRequested => {
                write!(self.out, "{BLUE}You{RESET}: ")?;
            }
            AgentStreamEvent::Chunk { content } => {
                if self.speaking {
                    write!(self.out, "{content}")?;
                } else {
                    let content = content.trim_start();
                    if content.is_empty() {
                        return Ok(());
                    }
                    write!(self.out, "{YELLOW}{}{RESET}: {content}", self.agent_name)?;
                    self.speaking = true;
                }
            }
            AgentStreamEvent::ResponseDone { .. } => {
                if self.speaking {
                    writeln!(self.out)?;
                }
                self.speaking = false;
            }
            AgentStreamEvent::ToolCall { name, arguments } => {
                let arguments = serde_json::Value::Object(arguments);
                write!(self.out, "{GREEN}Tool{RESET}: {name}({arguments}) ")?;
            }
            AgentStreamEvent::ToolResult { bytes, .. } => {
                writeln!(self.out, "output {bytes} bytes")?;
            }
            AgentStreamEvent::ToolFailed { error, .. } => {
                writeln!(self.out, "{RED}error{RESET}: {error}")?;
            }
            AgentStreamEvent::Error { message } => {
                writeln!(self.out, "{RED}error{RESET}: failed to get response: {message}")?;
            }
        }
        self.out.flush()
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EventSink for Terminal<W> {
    fn emit(&mut self, event: AgentStreamEvent) {
        if let Err(e) = self.render(event) {
            warn!(error = %e, "Failed to write to terminal");
        }
    }
}
