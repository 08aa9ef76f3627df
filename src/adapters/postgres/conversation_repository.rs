//! PostgreSQL implementation of ConversationRepository.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::conversation::{Conversation, MessageRole, StoredMessage};
use crate::domain::foundation::{ConversationId, MessageId, Timestamp, UserId};
use crate::ports::{ConversationRepository, ConversationSummary, RepositoryError};

use super::map_sqlx_error;

/// PostgreSQL implementation of ConversationRepository.
#[derive(Clone)]
pub struct PostgresConversationRepository {
    pool: PgPool,
}

impl PostgresConversationRepository {
    /// Creates a new PostgresConversationRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationRepository for PostgresConversationRepository {
    async fn create(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO conversations (id, user_id, title, is_completed, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(conversation.id().as_uuid())
        .bind(conversation.user_id().as_uuid())
        .bind(conversation.title())
        .bind(conversation.is_completed())
        .bind(conversation.created_at().as_datetime())
        .bind(conversation.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to insert conversation", e))?;

        Ok(())
    }

    async fn find_for_user(
        &self,
        id: ConversationId,
        user_id: UserId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, title, is_completed, created_at, updated_at
            FROM conversations
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to fetch conversation", e))?;

        Ok(row.map(|row| row_to_conversation(&row)))
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<ConversationSummary>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.title, c.is_completed, c.created_at,
                   COUNT(m.id) AS message_count
            FROM conversations c
            LEFT JOIN messages m ON m.conversation_id = c.id
            WHERE c.user_id = $1
            GROUP BY c.id
            ORDER BY c.created_at DESC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(skip as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to list conversations", e))?;

        Ok(rows
            .iter()
            .map(|row| ConversationSummary {
                id: ConversationId::from_uuid(row.get("id")),
                title: row.get("title"),
                is_completed: row.get("is_completed"),
                created_at: Timestamp::from_datetime(row.get("created_at")),
                message_count: row.get::<i64, _>("message_count") as u32,
            })
            .collect())
    }

    async fn update(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET title = $2, is_completed = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(conversation.id().as_uuid())
        .bind(conversation.title())
        .bind(conversation.is_completed())
        .bind(conversation.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to update conversation", e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn append_message(&self, message: &StoredMessage) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, role, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(message.id.as_uuid())
        .bind(message.conversation_id.as_uuid())
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(message.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to insert message", e))?;

        Ok(())
    }

    async fn list_messages(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<StoredMessage>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, conversation_id, role, content, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(conversation_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to fetch messages", e))?;

        rows.iter().map(row_to_message).collect()
    }

    async fn latest_assistant_message(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<StoredMessage>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, conversation_id, role, content, created_at
            FROM messages
            WHERE conversation_id = $1 AND role = 'assistant'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(conversation_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to fetch latest assistant message", e))?;

        row.as_ref().map(row_to_message).transpose()
    }

    async fn commit_turn(
        &self,
        message: &StoredMessage,
        conversation: &Conversation,
    ) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("Failed to start transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, role, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(message.id.as_uuid())
        .bind(message.conversation_id.as_uuid())
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(message.created_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to insert assistant message", e))?;

        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET title = $2, is_completed = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(conversation.id().as_uuid())
        .bind(conversation.title())
        .bind(conversation.is_completed())
        .bind(conversation.updated_at().as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to update conversation state", e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("Failed to commit turn", e))?;

        Ok(())
    }
}

fn row_to_conversation(row: &sqlx::postgres::PgRow) -> Conversation {
    Conversation::reconstitute(
        ConversationId::from_uuid(row.get("id")),
        UserId::from_uuid(row.get("user_id")),
        row.get("title"),
        row.get("is_completed"),
        Timestamp::from_datetime(row.get("created_at")),
        Timestamp::from_datetime(row.get("updated_at")),
    )
}

fn row_to_message(row: &sqlx::postgres::PgRow) -> Result<StoredMessage, RepositoryError> {
    let role_str: &str = row.get("role");
    let role = MessageRole::parse(role_str).ok_or_else(|| {
        RepositoryError::Database(format!("Unknown message role: {}", role_str))
    })?;

    Ok(StoredMessage {
        id: MessageId::from_uuid(row.get("id")),
        conversation_id: ConversationId::from_uuid(row.get("conversation_id")),
        role,
        content: row.get("content"),
        created_at: Timestamp::from_datetime(row.get("created_at")),
    })
}
