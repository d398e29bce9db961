//! The Nexus decision loop.
//!
//! The agent is a four-state machine:
//!
//! 1. **Start** a request with exactly one user message
//! 2. **Decide**: send the history (system prompt first) to the model
//! 3. **Act**: if the model asked for tools, run every request and loop back
//! 4. **End** as soon as a model response carries no tool calls
//!
//! Every Decision Node output is emitted as a [`StreamEvent`] the moment it
//! is produced; the gateway turns those into NDJSON lines.

pub mod graph;
pub mod prompt;
pub mod stream_event;

#[cfg(test)]
mod test_helpers;

pub use graph::{AgentGraph, LoopState, Route, route};
pub use prompt::SYSTEM_PROMPT;
pub use stream_event::StreamEvent;
