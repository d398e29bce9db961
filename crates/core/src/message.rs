//! Message and Conversation State domain types.
//!
//! These are the value objects that flow through one chat request:
//! the gateway seeds a [`ConversationState`] with the user's message, the
//! agent loop appends model responses and tool results, and the gateway
//! streams the normalized text of each model response back to the client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::ToolError;
use crate::ui::UiComponent;

/// Unique identifier for a conversation (one per chat request).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The language model
    Assistant,
    /// The fixed system prompt
    System,
    /// Tool execution result
    Tool,
}

/// One element of a block-sequence content payload.
///
/// Models sometimes answer with a list mixing bare strings and
/// `{"type": "text", "text": "..."}` records. Anything else is kept as
/// [`ContentBlock::Other`] and ignored by normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentBlock {
    /// A bare string block.
    Text(String),

    /// A record carrying a `text` field.
    Structured {
        #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        text: String,
    },

    /// Any other block shape (images, citations, ...).
    Other(serde_json::Value),
}

impl ContentBlock {
    /// Build a `{"type": "text", "text": ...}` block.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Structured {
            kind: Some("text".into()),
            text: text.into(),
        }
    }

    /// The displayable text of this block, if it has any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Structured { text, .. } => Some(text),
            Self::Other(_) => None,
        }
    }
}

/// Message content: either a plain string or a sequence of blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl MessageContent {
    /// Collapse the content to plain text.
    ///
    /// Blocks are concatenated in order; blocks without text are dropped.
    pub fn normalized_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Blocks(blocks) => blocks.iter().filter_map(ContentBlock::as_text).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Blocks(blocks) => blocks.is_empty(),
        }
    }
}

impl Default for MessageContent {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<ContentBlock>> for MessageContent {
    fn from(blocks: Vec<ContentBlock>) -> Self {
        Self::Blocks(blocks)
    }
}

/// `null` content (common on tool-calling turns) reads as empty text.
fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<MessageContent, D::Error> {
    Ok(Option::<MessageContent>::deserialize(d)?.unwrap_or_default())
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The content, plain or block-structured
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: MessageContent,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: MessageContent) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self::with_role(Role::User, content.into())
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self::with_role(Role::Assistant, content.into())
    }

    /// Create a new system message.
    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self::with_role(Role::System, content.into())
    }

    /// Create a tool result message correlated to `tool_call_id`.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::with_role(Role::Tool, MessageContent::Text(content.into()))
        }
    }

    /// Attach tool call requests (assistant messages only).
    pub fn with_tool_calls(mut self, tool_calls: Vec<MessageToolCall>) -> Self {
        self.tool_calls = tool_calls;
        self
    }

    /// Whether the model asked for at least one tool invocation.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Normalized plain text of the content.
    pub fn text(&self) -> String {
        self.content.normalized_text()
    }
}

/// A tool call embedded in an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageToolCall {
    /// Unique ID for this tool call
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as a JSON string, exactly as the model produced them
    pub arguments: String,
}

impl MessageToolCall {
    /// Decode the raw argument string. An empty string decodes to `{}`.
    pub fn parsed_arguments(&self) -> std::result::Result<serde_json::Value, ToolError> {
        if self.arguments.trim().is_empty() {
            return Ok(serde_json::json!({}));
        }
        serde_json::from_str(&self.arguments).map_err(|e| {
            ToolError::InvalidArguments(format!("{} (call {}): {e}", self.name, self.id))
        })
    }
}

/// The per-request conversation: append-only history plus an optional
/// pending UI payload extracted from the latest model answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    /// Unique conversation ID
    pub id: ConversationId,

    /// Ordered messages
    pub messages: Vec<Message>,

    /// Chart or table the model embedded in its most recent answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_component: Option<UiComponent>,

    /// When this conversation was created
    pub created_at: DateTime<Utc>,

    /// When the last message was added
    pub updated_at: DateTime<Utc>,
}

impl ConversationState {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            messages: Vec::new(),
            ui_component: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// A fresh conversation holding exactly one user message.
    pub fn from_user_message(text: impl Into<String>) -> Self {
        let text: String = text.into();
        let mut state = Self::new();
        state.push(Message::user(text));
        state
    }

    /// Append a message. History is never rewritten.
    pub fn push(&mut self, message: Message) {
        if message.role == Role::Assistant
            && let Some(component) = UiComponent::extract(&message.text())
        {
            self.ui_component = Some(component);
        }
        self.updated_at = Utc::now();
        self.messages.push(message);
    }

    /// Append several messages in order.
    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        for message in messages {
            self.push(message);
        }
    }

    /// Put `prompt` at index 0 unless the conversation already starts with a
    /// system message. Returns `true` when the prompt was inserted.
    pub fn ensure_system_prompt(&mut self, prompt: &str) -> bool {
        if self
            .messages
            .first()
            .is_some_and(|m| m.role == Role::System)
        {
            return false;
        }
        self.messages.insert(0, Message::system(prompt));
        self.updated_at = Utc::now();
        true
    }

    /// The most recently appended message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}
