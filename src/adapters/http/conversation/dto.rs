//! HTTP DTOs for conversation endpoints.
//!
//! These types decouple the HTTP API from domain types, allowing
//! independent evolution.

use serde::{Deserialize, Serialize};

use crate::domain::conversation::{Conversation, MessageRole, StoredMessage};
use crate::ports::ConversationSummary;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to create a conversation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    /// Optional explicit title; otherwise derived from the first message.
    pub title: Option<String>,
}

/// Request to update a conversation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConversationRequest {
    pub title: Option<String>,
    /// Only the forward transition is allowed; a completed conversation
    /// cannot be reopened.
    pub is_completed: Option<bool>,
}

/// Request to run one conversational turn.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    /// The user's message text.
    pub content: String,
}

/// Maximum allowed message length (10,000 characters).
pub const MAX_MESSAGE_LENGTH: usize = 10_000;

impl SendMessageRequest {
    /// Validates the message content.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.content.trim().is_empty() {
            return Err("Message content cannot be empty");
        }
        if self.content.len() > MAX_MESSAGE_LENGTH {
            return Err("Message content exceeds maximum length");
        }
        Ok(())
    }
}

/// Query parameters for paginated listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    #[serde(default)]
    pub skip: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl PaginationParams {
    /// Default page size.
    pub const DEFAULT_LIMIT: u32 = 20;
    /// Maximum allowed page size.
    pub const MAX_LIMIT: u32 = 100;

    /// Get the effective skip.
    pub fn effective_skip(&self) -> u32 {
        self.skip.unwrap_or(0)
    }

    /// Get the effective limit, capped at MAX_LIMIT.
    pub fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .min(Self::MAX_LIMIT)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Listing row for a conversation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummaryView {
    pub id: String,
    pub title: Option<String>,
    pub is_completed: bool,
    pub created_at: String,
    pub message_count: u32,
}

impl From<&ConversationSummary> for ConversationSummaryView {
    fn from(summary: &ConversationSummary) -> Self {
        Self {
            id: summary.id.to_string(),
            title: summary.title.clone(),
            is_completed: summary.is_completed,
            created_at: summary.created_at.to_rfc3339(),
            message_count: summary.message_count,
        }
    }
}

/// Detail view of a conversation with its ordered message history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDetailView {
    pub id: String,
    pub title: Option<String>,
    pub is_completed: bool,
    pub created_at: String,
    pub updated_at: String,
    pub messages: Vec<MessageView>,
}

impl ConversationDetailView {
    /// Builds the view from the aggregate plus its ordered messages.
    pub fn new(conversation: &Conversation, messages: &[StoredMessage]) -> Self {
        Self {
            id: conversation.id().to_string(),
            title: conversation.title().map(str::to_string),
            is_completed: conversation.is_completed(),
            created_at: conversation.created_at().to_rfc3339(),
            updated_at: conversation.updated_at().to_rfc3339(),
            messages: messages.iter().map(MessageView::from).collect(),
        }
    }
}

/// View of a single message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: String,
    pub conversation_id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: String,
}

impl From<&StoredMessage> for MessageView {
    fn from(message: &StoredMessage) -> Self {
        Self {
            id: message.id.to_string(),
            conversation_id: message.conversation_id.to_string(),
            role: message.role,
            content: message.content.clone(),
            created_at: message.created_at.to_rfc3339(),
        }
    }
}
