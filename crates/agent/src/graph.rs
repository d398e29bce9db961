//! The decision loop as an explicit state machine.
//!
//! ```text
//! Start ──► Decide ──(tool calls)──► Act ──┐
//!             ▲                            │
//!             └────────────────────────────┘
//!           Decide ──(no tool calls)──► End
//! ```

use std::sync::Arc;

use nexus_config::AppConfig;
use nexus_core::message::ConversationState;
use nexus_core::provider::{Provider, ProviderRequest};
use nexus_core::tool::{ToolCall, ToolRegistry};
use nexus_core::{Error, Message, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::prompt::SYSTEM_PROMPT;
use crate::stream_event::StreamEvent;

/// Events buffered between the loop task and the response body.
const STREAM_BUFFER: usize = 32;

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Start,
    Decide,
    Act,
    End,
}

/// Outcome of the routing predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    InvokeTools,
    Terminate,
}

/// Route on the latest message only: any tool call means `InvokeTools`.
pub fn route(state: &ConversationState) -> Route {
    match state.last() {
        Some(message) if message.has_tool_calls() => Route::InvokeTools,
        _ => Route::Terminate,
    }
}

impl LoopState {
    /// The transition function. `End` is absorbing.
    pub fn next(self, state: &ConversationState) -> LoopState {
        match self {
            LoopState::Start | LoopState::Act => LoopState::Decide,
            LoopState::Decide => match route(state) {
                Route::InvokeTools => LoopState::Act,
                Route::Terminate => LoopState::End,
            },
            LoopState::End => LoopState::End,
        }
    }
}

/// Drives one conversation from the user's question to a final answer.
///
/// Provider, tools, and settings are shared read-only; each request owns
/// its [`ConversationState`].
pub struct AgentGraph {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    max_iterations: u32,
}

impl AgentGraph {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            tools,
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
            max_iterations: 25,
        }
    }

    /// Build a graph with the model settings of a validated configuration.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        let graph = Self::new(provider, tools, &config.model)
            .with_temperature(config.temperature)
            .with_max_iterations(config.max_iterations);
        match config.max_tokens {
            Some(max) => graph.with_max_tokens(max),
            None => graph,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Bound the number of Decision Node calls per request.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Decision Node: ask the model what to do next and append its answer.
    pub async fn decide(&self, state: &mut ConversationState) -> Result<()> {
        if state.ensure_system_prompt(SYSTEM_PROMPT) {
            debug!(conversation_id = %state.id, "Inserted system prompt");
        }

        let request = ProviderRequest {
            model: self.model.clone(),
            messages: state.messages.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: self.tools.definitions(),
        };

        debug!(
            conversation_id = %state.id,
            provider = self.provider.name(),
            messages = request.messages.len(),
            "Calling model"
        );

        let response = self.provider.complete(request).await.map_err(|e| {
            warn!(conversation_id = %state.id, error = %e, "Model call failed");
            e
        })?;

        if let Some(usage) = &response.usage {
            info!(
                conversation_id = %state.id,
                model = %response.model,
                tokens = usage.total_tokens,
                tool_calls = response.message.tool_calls.len(),
                "Model responded"
            );
        }

        state.push(response.message);
        Ok(())
    }

    /// Tool Invocation Adapter: run every tool call of the latest message in
    /// order, appending one tool-result message per call.
    ///
    /// Returns the appended results as `(call id, tool name, output)`.
    pub async fn act(&self, state: &mut ConversationState) -> Result<Vec<(String, String, String)>> {
        let calls = state
            .last()
            .map(|m| m.tool_calls.clone())
            .unwrap_or_default();

        let mut results = Vec::with_capacity(calls.len());
        for tc in calls {
            let call = ToolCall {
                arguments: tc.parsed_arguments()?,
                id: tc.id.clone(),
                name: tc.name.clone(),
            };

            debug!(tool = %call.name, call_id = %call.id, "Executing tool");

            let output = match self.tools.execute(&call).await {
                Ok(result) => result.output,
                Err(e) => {
                    warn!(tool = %call.name, error = %e, "Tool execution failed");
                    return Err(e.into());
                }
            };

            state.push(Message::tool_result(&call.id, output.clone()));
            results.push((call.id, call.name, output));
        }
        Ok(results)
    }

    /// Drive the loop to `End` and return the final answer text.
    pub async fn run(&self, state: &mut ConversationState) -> Result<String> {
        self.drive(state, None).await
    }

    /// Run the loop on a background task, reporting progress as events.
    ///
    /// The receiver yields one `Message` per Decision Node output as soon as
    /// it exists, `ToolResult`s for each tool call, and on failure exactly
    /// one trailing `Error`. The channel closes when the loop is done.
    pub fn run_stream(self: Arc<Self>, mut state: ConversationState) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);

        tokio::spawn(async move {
            match self.drive(&mut state, Some(&tx)).await {
                Ok(_) => debug!(conversation_id = %state.id, "Stream complete"),
                Err(e) => {
                    warn!(conversation_id = %state.id, error = %e, "Loop failed");
                    let _ = tx.send(StreamEvent::error(&e)).await;
                }
            }
        });

        rx
    }

    async fn drive(
        &self,
        state: &mut ConversationState,
        events: Option<&mpsc::Sender<StreamEvent>>,
    ) -> Result<String> {
        info!(
            conversation_id = %state.id,
            messages = state.len(),
            "Processing conversation"
        );

        let mut current = LoopState::Start;
        let mut decisions = 0u32;
        let mut answer = String::new();

        loop {
            current = current.next(state);
            match current {
                LoopState::Decide => {
                    decisions += 1;
                    if decisions > self.max_iterations {
                        warn!(
                            conversation_id = %state.id,
                            limit = self.max_iterations,
                            "Max iterations reached"
                        );
                        return Err(Error::MaxIterations(self.max_iterations));
                    }
                    debug!(conversation_id = %state.id, iteration = decisions, "Decide");

                    self.decide(state).await?;
                    answer = state.last().map(Message::text).unwrap_or_default();
                    emit(events, StreamEvent::message(answer.clone())).await?;
                }
                LoopState::Act => {
                    for (tool_call_id, name, content) in self.act(state).await? {
                        emit(
                            events,
                            StreamEvent::ToolResult {
                                tool_call_id,
                                name,
                                content,
                            },
                        )
                        .await?;
                    }
                }
                LoopState::End => {
                    info!(
                        conversation_id = %state.id,
                        iterations = decisions,
                        ui_component = state.ui_component.is_some(),
                        "Conversation complete"
                    );
                    return Ok(answer);
                }
                LoopState::Start => unreachable!("no transition leads back to Start"),
            }
        }
    }
}

/// Forward an event; a dropped receiver means the client went away.
async fn emit(events: Option<&mpsc::Sender<StreamEvent>>, event: StreamEvent) -> Result<()> {
    let Some(tx) = events else {
        return Ok(());
    };
    tx.send(event)
        .await
        .map_err(|_| Error::Internal("stream receiver dropped".into()))
}
