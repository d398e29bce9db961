//! HTTP streaming gateway for Nexus.
//!
//! Two routes:
//! - `POST /chat` runs one conversation and streams every model answer as a
//!   newline-delimited JSON line while the loop is still working
//! - `GET /health` is a static liveness probe
//!
//! Built on Axum; CORS admits exactly the configured browser origins with
//! credentials.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderValue, header},
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::info;

use nexus_agent::{AgentGraph, StreamEvent};
use nexus_config::AppConfig;
use nexus_core::ConversationState;

/// Media type of the `/chat` response body.
pub const NDJSON: &str = "application/x-ndjson";

/// Shared application state for the gateway.
pub struct GatewayState {
    pub agent: Arc<AgentGraph>,
    pub allowed_origins: Vec<String>,
}

pub type SharedState = Arc<GatewayState>;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Invalid CORS origin {origin:?}")]
    InvalidOrigin { origin: String },

    #[error("Failed to build provider: {0}")]
    Provider(#[from] nexus_core::ProviderError),

    #[error("Failed to build tools: {0}")]
    Tool(#[from] nexus_core::ToolError),

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Result<Router, GatewayError> {
    let cors = cors_layer(&state.allowed_origins)?;

    Ok(Router::new()
        .route("/chat", post(chat_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state))
}

/// Exact-origin CORS with credentials. Methods and headers are mirrored
/// from the preflight since wildcards are not allowed alongside credentials.
fn cors_layer(origins: &[String]) -> Result<CorsLayer, GatewayError> {
    let origins = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|_| GatewayError::InvalidOrigin { origin: o.clone() })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

/// Start the gateway HTTP server.
///
/// Provider, tools, and the loop are built once and shared by all requests.
pub async fn start(config: AppConfig) -> Result<(), GatewayError> {
    let addr = config.gateway.bind_addr();

    let provider = Arc::new(nexus_providers::OpenAiCompatProvider::gemini(&config)?);
    let tools = Arc::new(nexus_tools::default_registry(&config)?);
    let agent = Arc::new(AgentGraph::from_config(&config, provider, tools));

    let state = Arc::new(GatewayState {
        agent,
        allowed_origins: config.gateway.allowed_origins.clone(),
    });
    let app = build_router(state)?;

    info!(addr = %addr, model = %config.model, "Nexus engine starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    let conversation = ConversationState::from_user_message(request.message);
    info!(conversation_id = %conversation.id, "Chat request");

    let events = state.agent.clone().run_stream(conversation);
    let lines = ReceiverStream::new(events)
        .filter(StreamEvent::is_wire_visible)
        .map(|event| event.to_ndjson());

    ([(header::CONTENT_TYPE, NDJSON)], Body::from_stream(lines))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    engine: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        engine: "nexus-v1",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::http::{Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use nexus_core::{
        Message, MessageToolCall, Provider, ProviderError, ProviderRequest, ProviderResponse, Tool,
        ToolError, ToolRegistry, ToolResult,
    };
    use std::sync::Mutex;
    use tower::ServiceExt;

    struct ScriptedProvider {
        script: Mutex<Vec<ProviderResponse>>,
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                return Err(ProviderError::Network("script exhausted".into()));
            }
            Ok(script.remove(0))
        }
    }

    struct BrokenSearch;

    #[async_trait]
    impl Tool for BrokenSearch {
        fn name(&self) -> &str {
            "web_search"
        }
        fn description(&self) -> &str {
            "always fails"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }
        async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
            Err(ToolError::ExecutionFailed {
                tool_name: "web_search".into(),
                reason: "search API returned 502".into(),
            })
        }
    }

    fn reply(message: Message) -> ProviderResponse {
        ProviderResponse {
            message,
            usage: None,
            model: "scripted".into(),
        }
    }

    fn test_state(script: Vec<ProviderResponse>) -> SharedState {
        let provider = Arc::new(ScriptedProvider {
            script: Mutex::new(script),
        });
        let mut tools = ToolRegistry::new();
        tools.register(Box::new(BrokenSearch));
        Arc::new(GatewayState {
            agent: Arc::new(AgentGraph::new(provider, Arc::new(tools), "scripted")),
            allowed_origins: AppConfig::default().gateway.allowed_origins,
        })
    }

    fn chat_request(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_lines(response: axum::response::Response) -> Vec<serde_json::Value> {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec())
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = build_router(test_state(vec![])).unwrap();

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({"status": "ok", "engine": "nexus-v1"}));
    }

    #[tokio::test]
    async fn hello_streams_exactly_one_line() {
        let app = build_router(test_state(vec![reply(Message::assistant("Hi there!"))])).unwrap();

        let response = app.oneshot(chat_request(r#"{"message":"Hello"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], NDJSON);

        let lines = body_lines(response).await;
        assert_eq!(
            lines,
            vec![serde_json::json!({"type": "message", "content": "Hi there!"})]
        );
    }

    #[tokio::test]
    async fn tool_failure_ends_stream_with_error_line() {
        let tool_turn = Message::assistant("").with_tool_calls(vec![MessageToolCall {
            id: "call_1".into(),
            name: "web_search".into(),
            arguments: r#"{"query":"iPhone 16 battery"}"#.into(),
        }]);
        let app = build_router(test_state(vec![reply(tool_turn)])).unwrap();

        let response = app
            .oneshot(chat_request(r#"{"message":"Compare battery life"}"#))
            .await
            .unwrap();
        let lines = body_lines(response).await;

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], serde_json::json!({"type": "message", "content": ""}));
        assert_eq!(lines[1]["type"], "error");
        let content = lines[1]["content"].as_str().unwrap();
        assert!(content.starts_with("Server Error: "));
        assert!(content.contains("search API returned 502"));
    }

    #[tokio::test]
    async fn provider_failure_yields_single_error_line() {
        let app = build_router(test_state(vec![])).unwrap();

        let response = app.oneshot(chat_request(r#"{"message":"Hello"}"#)).await.unwrap();
        let lines = body_lines(response).await;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["type"], "error");
    }

    #[tokio::test]
    async fn malformed_body_is_rejected_before_streaming() {
        let app = build_router(test_state(vec![])).unwrap();

        let response = app.oneshot(chat_request(r#"{"msg":1}"#)).await.unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn cors_preflight_allows_configured_origin_with_credentials() {
        let app = build_router(test_state(vec![])).unwrap();

        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/chat")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        let headers = response.headers();
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST");
    }

    #[tokio::test]
    async fn cors_ignores_unknown_origin() {
        let app = build_router(test_state(vec![])).unwrap();

        let req = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "https://evil.example")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }

    #[test]
    fn invalid_origin_is_rejected() {
        let err = cors_layer(&["bad\norigin".to_string()]).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidOrigin { .. }));
    }
}
