//! Error types for the Nexus domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant; the streaming boundary
//! does not classify them further and only renders their `Display` form.

use thiserror::Error;

/// The top-level error type for all Nexus operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Loop control ---
    #[error("Agent loop exceeded {0} model calls without a final answer")]
    MaxIterations(u32),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn tool_error_displays_correctly() {
        let err = Error::Tool(ToolError::ExecutionFailed {
            tool_name: "web_search".into(),
            reason: "search API returned 500".into(),
        });
        assert!(err.to_string().contains("web_search"));
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn unknown_tool_converts_into_top_level_error() {
        let err: Error = ToolError::NotFound("calculator".into()).into();
        assert!(matches!(err, Error::Tool(ToolError::NotFound(_))));
        assert_eq!(err.to_string(), "Tool error: Tool not found: calculator");
    }

    #[test]
    fn max_iterations_mentions_limit() {
        let err = Error::MaxIterations(25);
        assert!(err.to_string().contains("25"));
    }
}
