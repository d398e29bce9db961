//! `nexus ask`: run one question and print each step of the loop.

use std::sync::Arc;

use nexus_agent::{AgentGraph, StreamEvent};
use nexus_config::AppConfig;
use nexus_core::ConversationState;

/// Characters of each step's text shown on screen.
const PREVIEW_CHARS: usize = 300;

pub async fn run(message: String) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let provider = Arc::new(nexus_providers::OpenAiCompatProvider::gemini(&config)?);
    let tools = Arc::new(nexus_tools::default_registry(&config)?);
    let agent = Arc::new(AgentGraph::from_config(&config, provider, tools));

    println!("Connecting to Nexus ({})...", config.model);
    println!("User Question: {message}\n");

    let mut events = agent.run_stream(ConversationState::from_user_message(message));
    let mut failure = None;
    while let Some(event) = events.recv().await {
        if let StreamEvent::Error { content } = &event {
            failure = Some(content.clone());
        }
        print!("{}", render(&event));
    }

    match failure {
        Some(content) => Err(content.into()),
        None => Ok(()),
    }
}

/// One step as printed to the terminal.
fn render(event: &StreamEvent) -> String {
    match event {
        StreamEvent::Message { content } if content.is_empty() => "--- Step: decide ---\n".into(),
        StreamEvent::Message { content } => {
            format!("--- Step: decide ---\nAI: {}...\n\n", preview(content))
        }
        StreamEvent::ToolResult { name, content, .. } => {
            format!("--- Step: act ---\n{name}: {}...\n\n", preview(content))
        }
        StreamEvent::Error { content } => {
            format!("Error: {content}\nHint: Check your .env file and API keys!\n")
        }
    }
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}
