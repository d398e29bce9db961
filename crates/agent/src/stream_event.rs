//! Agent-level streaming events.
//!
//! `StreamEvent` is what the loop reports while it runs. `Message` and
//! `Error` are the two line kinds of the NDJSON wire format; `ToolResult`
//! is only observed in-process (the CLI prints it as an `act` step).

use serde::{Deserialize, Serialize};

/// Events emitted by the agent during streaming execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Normalized text of one Decision Node output.
    Message { content: String },

    /// One tool invocation finished.
    ToolResult {
        tool_call_id: String,
        name: String,
        content: String,
    },

    /// Terminal failure. Always the last event of a stream.
    Error { content: String },
}

impl StreamEvent {
    pub fn message(content: impl Into<String>) -> Self {
        Self::Message {
            content: content.into(),
        }
    }

    /// The client-facing failure line, prefixed the way the frontend expects.
    pub fn error(err: &impl std::fmt::Display) -> Self {
        Self::Error {
            content: format!("Server Error: {err}"),
        }
    }

    /// Whether this event is written to HTTP clients.
    pub fn is_wire_visible(&self) -> bool {
        !matches!(self, Self::ToolResult { .. })
    }

    /// Serialize to one NDJSON line, including the trailing newline.
    pub fn to_ndjson(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}
