//! LLM Provider implementations for Nexus.
//!
//! All providers implement the `nexus_core::Provider` trait. Nexus talks to
//! Gemini through its OpenAI-compatible chat-completions surface, so one
//! implementation covers the production backend and any local stand-in.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
