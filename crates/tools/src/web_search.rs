//! Web search tool backed by the Tavily search API.
//!
//! Each call posts the query to `{search_url}/search` and hands the model a
//! compact JSON list of `{title, url, content}` records. Upstream failures
//! are returned as errors; the loop does not retry them.

use async_trait::async_trait;
use nexus_config::AppConfig;
use nexus_core::error::ToolError;
use nexus_core::tool::{Tool, ToolResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const TOOL_NAME: &str = "web_search";

pub struct WebSearchTool {
    base_url: String,
    api_key: String,
    max_results: u32,
    client: reqwest::Client,
}

impl WebSearchTool {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        max_results: u32,
    ) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| failed(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            max_results,
            client,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ToolError> {
        Self::new(
            &config.search_url,
            config.tavily_api_key(),
            config.search_max_results,
        )
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ToolError> {
        let url = format!("{}/search", self.base_url);
        let body = SearchRequest {
            api_key: &self.api_key,
            query,
            max_results: self.max_results,
        };

        debug!(query, max_results = self.max_results, "Searching the web");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| failed(format!("search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %error_body, "Search API returned error");
            return Err(failed(format!(
                "search API returned {}: {error_body}",
                status.as_u16()
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| failed(format!("unreadable search response: {e}")))?;

        let mut results = parsed.results;
        results.truncate(self.max_results as usize);
        Ok(results)
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "A search engine optimized for comprehensive, accurate, and trusted results. \
         Useful for when you need to answer questions about current events. \
         Input should be a search query."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = arguments["query"]
            .as_str()
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

        let results = self.search(query).await?;
        debug!(query, count = results.len(), "Search complete");

        let output = serde_json::to_string(&results)
            .map_err(|e| failed(format!("could not encode results: {e}")))?;

        Ok(ToolResult {
            call_id: String::new(),
            output,
        })
    }
}

fn failed(reason: String) -> ToolError {
    ToolError::ExecutionFailed {
        tool_name: TOOL_NAME.into(),
        reason,
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: u32,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
}
