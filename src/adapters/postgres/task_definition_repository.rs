//! PostgreSQL implementation of TaskDefinitionRepository.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::conversation::Conversation;
use crate::domain::foundation::{ConversationId, TaskDefinitionId, Timestamp, UserId};
use crate::domain::task_definition::TaskDefinition;
use crate::ports::{RepositoryError, TaskDefinitionRepository};

use super::map_sqlx_error;

/// PostgreSQL implementation of TaskDefinitionRepository.
#[derive(Clone)]
pub struct PostgresTaskDefinitionRepository {
    pool: PgPool,
}

impl PostgresTaskDefinitionRepository {
    /// Creates a new PostgresTaskDefinitionRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskDefinitionRepository for PostgresTaskDefinitionRepository {
    async fn create(
        &self,
        definition: &TaskDefinition,
        conversation: &Conversation,
    ) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("Failed to start transaction", e))?;

        // The unique index on conversation_id turns a racing duplicate
        // into a Conflict instead of a second row.
        sqlx::query(
            r#"
            INSERT INTO task_definitions
                (id, conversation_id, user_id, name, description, json_schema,
                 recommended_models, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(definition.id.as_uuid())
        .bind(definition.conversation_id.as_uuid())
        .bind(definition.user_id.as_uuid())
        .bind(&definition.name)
        .bind(definition.description.as_deref())
        .bind(&definition.json_schema)
        .bind(
            definition
                .recommended_models
                .as_ref()
                .map(|models| serde_json::json!(models)),
        )
        .bind(definition.created_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to insert task definition", e))?;

        sqlx::query(
            r#"
            UPDATE conversations
            SET is_completed = $2, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(conversation.id().as_uuid())
        .bind(conversation.is_completed())
        .bind(conversation.updated_at().as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to complete conversation", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("Failed to commit task definition", e))?;

        Ok(())
    }

    async fn find_for_user(
        &self,
        id: TaskDefinitionId,
        user_id: UserId,
    ) -> Result<Option<TaskDefinition>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, conversation_id, user_id, name, description, json_schema,
                   recommended_models, created_at
            FROM task_definitions
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to fetch task definition", e))?;

        row.as_ref().map(row_to_definition).transpose()
    }

    async fn find_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<TaskDefinition>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, conversation_id, user_id, name, description, json_schema,
                   recommended_models, created_at
            FROM task_definitions
            WHERE conversation_id = $1
            "#,
        )
        .bind(conversation_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to fetch task definition", e))?;

        row.as_ref().map(row_to_definition).transpose()
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<TaskDefinition>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, conversation_id, user_id, name, description, json_schema,
                   recommended_models, created_at
            FROM task_definitions
            WHERE user_id = $1
            ORDER BY created_at DESC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(skip as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to list task definitions", e))?;

        rows.iter().map(row_to_definition).collect()
    }

    async fn delete(&self, id: TaskDefinitionId, user_id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM task_definitions
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to delete task definition", e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

fn row_to_definition(row: &sqlx::postgres::PgRow) -> Result<TaskDefinition, RepositoryError> {
    let recommended_models: Option<serde_json::Value> = row.get("recommended_models");
    let recommended_models = recommended_models
        .map(|value| {
            serde_json::from_value(value)
                .map_err(|e| RepositoryError::Database(format!("Bad recommended_models: {}", e)))
        })
        .transpose()?;

    Ok(TaskDefinition {
        id: TaskDefinitionId::from_uuid(row.get("id")),
        conversation_id: ConversationId::from_uuid(row.get("conversation_id")),
        user_id: UserId::from_uuid(row.get("user_id")),
        name: row.get("name"),
        description: row.get("description"),
        json_schema: row.get("json_schema"),
        recommended_models,
        created_at: Timestamp::from_datetime(row.get("created_at")),
    })
}
