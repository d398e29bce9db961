//! Shared test doubles for the decision loop.

use async_trait::async_trait;
use nexus_core::error::{ProviderError, ToolError};
use nexus_core::message::{Message, MessageToolCall};
use nexus_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use nexus_core::tool::{Tool, ToolResult};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A provider that replays a fixed script and records every request.
///
/// Panics if called more often than the script allows.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replies(responses: Vec<ProviderResponse>) -> Self {
        Self::new(responses.into_iter().map(Ok).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedProvider: no response scripted for call #{call}"))
    }
}

/// A text-only answer.
pub fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "scripted-model".into(),
    }
}

/// An answer requesting one `web_search` call per query.
pub fn search_response(queries: &[&str]) -> ProviderResponse {
    let calls = queries
        .iter()
        .enumerate()
        .map(|(i, q)| MessageToolCall {
            id: format!("call_{}", i + 1),
            name: "web_search".into(),
            arguments: serde_json::json!({ "query": q }).to_string(),
        })
        .collect();
    ProviderResponse {
        message: Message::assistant("").with_tool_calls(calls),
        usage: None,
        model: "scripted-model".into(),
    }
}

/// A `web_search` stand-in that echoes the query and counts invocations.
#[derive(Default)]
pub struct StubSearch {
    calls: AtomicUsize,
    fail: bool,
}

impl StubSearch {
    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for StubSearch {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Stub search"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {"query": {"type": "string"}}})
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ToolError::ExecutionFailed {
                tool_name: "web_search".into(),
                reason: "search API returned 502".into(),
            });
        }
        let query = arguments["query"].as_str().unwrap_or_default();
        Ok(ToolResult {
            call_id: String::new(),
            output: format!("results for {query}"),
        })
    }
}

/// Lets a test keep a handle on a tool after boxing it into a registry.
pub struct Shared<T>(pub std::sync::Arc<T>);

#[async_trait]
impl<T: Tool> Tool for Shared<T> {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn description(&self) -> &str {
        self.0.description()
    }

    fn parameters_schema(&self) -> serde_json::Value {
        self.0.parameters_schema()
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        self.0.execute(arguments).await
    }
}
