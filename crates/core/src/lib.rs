//! # Nexus Core
//!
//! Domain types, traits, and error definitions for the Nexus search agent.
//! This crate has **no framework dependencies**; it defines the domain model
//! that the provider, tool, agent, and gateway crates implement against.
//!
//! ## Layout
//!
//! - [`message`]: messages, content normalization, and the per-request
//!   [`ConversationState`]
//! - [`ui`]: the `<UI_COMPONENT>` payloads the model may embed in its text
//! - [`provider`]: the [`Provider`] trait over language-model backends
//! - [`tool`]: the [`Tool`] trait and the [`ToolRegistry`]
//! - [`error`]: the error taxonomy shared by every crate

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;
pub mod ui;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, ToolError};
pub use message::{
    ContentBlock, ConversationId, ConversationState, Message, MessageContent, MessageToolCall,
    Role,
};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
pub use ui::UiComponent;
