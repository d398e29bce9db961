//! Built-in tool implementations for Nexus.
//!
//! The agent has exactly one capability: searching the web through Tavily.

pub mod web_search;

use nexus_config::AppConfig;
use nexus_core::error::ToolError;
use nexus_core::tool::ToolRegistry;

pub use web_search::WebSearchTool;

/// Create the tool registry declared to the model on every Decision Node call.
pub fn default_registry(config: &AppConfig) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(WebSearchTool::from_config(config)?));
    Ok(registry)
}
