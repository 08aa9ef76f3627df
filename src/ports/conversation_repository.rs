//! Conversation Repository Port - durable store for conversations and
//! their ordered message logs.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::conversation::{Conversation, StoredMessage};
use crate::domain::foundation::{ConversationId, Timestamp, UserId};

/// Errors from repository operations.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,

    #[error("conflicting record already exists")]
    Conflict,

    #[error("database error: {0}")]
    Database(String),
}

/// Summary row for conversation listings.
#[derive(Debug, Clone)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub title: Option<String>,
    pub is_completed: bool,
    pub created_at: Timestamp,
    pub message_count: u32,
}

/// Port for conversation persistence.
///
/// The message log is append-only per conversation: messages are never
/// updated, and `list_messages` returns them in ascending creation-time
/// order - the canonical dialogue context.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Persists a new conversation.
    async fn create(&self, conversation: &Conversation) -> Result<(), RepositoryError>;

    /// Finds a conversation by id, scoped to its owner.
    ///
    /// Returns `None` both when the conversation does not exist and when
    /// it belongs to another user, so callers cannot distinguish the two.
    async fn find_for_user(
        &self,
        id: ConversationId,
        user_id: UserId,
    ) -> Result<Option<Conversation>, RepositoryError>;

    /// Lists a user's conversations, newest first, with message counts.
    async fn list_for_user(
        &self,
        user_id: UserId,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<ConversationSummary>, RepositoryError>;

    /// Updates a conversation's title and completion flag.
    async fn update(&self, conversation: &Conversation) -> Result<(), RepositoryError>;

    /// Appends a single message to a conversation's log.
    async fn append_message(&self, message: &StoredMessage) -> Result<(), RepositoryError>;

    /// Returns all messages of a conversation in ascending creation-time
    /// order.
    async fn list_messages(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<StoredMessage>, RepositoryError>;

    /// Returns the most recent assistant message, if any.
    async fn latest_assistant_message(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<StoredMessage>, RepositoryError>;

    /// Atomically appends the assistant message of a finished turn and
    /// applies the conversation's state transition (completion flag,
    /// derived title, updated-at) as one unit.
    ///
    /// Either both the message and the conversation update are committed,
    /// or neither is.
    async fn commit_turn(
        &self,
        message: &StoredMessage,
        conversation: &Conversation,
    ) -> Result<(), RepositoryError>;
}
