//! Converts a completed conversation into a task definition.
//!
//! The schema is either supplied explicitly by the caller or extracted
//! lazily from the latest assistant message. Creation forces the parent
//! conversation into its completed state, atomically with the insert.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::conversation::{ExtractionError, SchemaExtractor};
use crate::domain::foundation::{ConversationId, UserId};
use crate::domain::task_definition::TaskDefinition;
use crate::ports::{ConversationRepository, RepositoryError, TaskDefinitionRepository};

/// Command to create a task definition from a conversation.
#[derive(Debug, Clone)]
pub struct CreateTaskDefinitionCommand {
    pub conversation_id: ConversationId,
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    /// Explicit schema; when absent, extraction runs against the latest
    /// assistant message.
    pub json_schema: Option<serde_json::Value>,
    pub recommended_models: Option<Vec<String>>,
}

/// Errors from task definition creation.
#[derive(Debug, Clone, Error)]
pub enum CreateTaskDefinitionError {
    /// The conversation does not exist or is not owned by the caller.
    #[error("conversation not found")]
    ConversationNotFound,

    /// A task definition already exists for this conversation.
    #[error("task definition already exists for this conversation")]
    AlreadyExists,

    /// No assistant message to extract a schema from.
    #[error("conversation has no assistant response to extract a schema from")]
    NoAssistantMessage,

    /// The latest assistant message holds no extractable schema.
    #[error("schema extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// Persistence failed.
    #[error("repository error: {0}")]
    Repository(String),
}

/// Handler for task definition creation.
pub struct CreateTaskDefinitionHandler {
    conversations: Arc<dyn ConversationRepository>,
    task_definitions: Arc<dyn TaskDefinitionRepository>,
    extractor: SchemaExtractor,
}

impl CreateTaskDefinitionHandler {
    /// Creates a new handler.
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        task_definitions: Arc<dyn TaskDefinitionRepository>,
    ) -> Self {
        Self {
            conversations,
            task_definitions,
            extractor: SchemaExtractor::new(),
        }
    }

    /// Creates the task definition, extracting the schema if necessary.
    ///
    /// # Errors
    ///
    /// - [`CreateTaskDefinitionError::ConversationNotFound`] on missing or
    ///   foreign conversations.
    /// - [`CreateTaskDefinitionError::AlreadyExists`] when the
    ///   conversation already has a definition (the first one stays
    ///   untouched).
    /// - [`CreateTaskDefinitionError::NoAssistantMessage`] /
    ///   [`CreateTaskDefinitionError::Extraction`] when no schema was
    ///   supplied and none can be extracted.
    pub async fn handle(
        &self,
        cmd: CreateTaskDefinitionCommand,
    ) -> Result<TaskDefinition, CreateTaskDefinitionError> {
        let mut conversation = self
            .conversations
            .find_for_user(cmd.conversation_id, cmd.user_id)
            .await
            .map_err(|e| CreateTaskDefinitionError::Repository(e.to_string()))?
            .ok_or(CreateTaskDefinitionError::ConversationNotFound)?;

        if self
            .task_definitions
            .find_by_conversation(cmd.conversation_id)
            .await
            .map_err(|e| CreateTaskDefinitionError::Repository(e.to_string()))?
            .is_some()
        {
            return Err(CreateTaskDefinitionError::AlreadyExists);
        }

        let json_schema = match cmd.json_schema {
            Some(schema) => schema,
            None => {
                let latest = self
                    .conversations
                    .latest_assistant_message(cmd.conversation_id)
                    .await
                    .map_err(|e| CreateTaskDefinitionError::Repository(e.to_string()))?
                    .ok_or(CreateTaskDefinitionError::NoAssistantMessage)?;
                self.extractor.extract(&latest.content)?
            }
        };

        let definition = TaskDefinition::new(
            cmd.conversation_id,
            cmd.user_id,
            cmd.name,
            cmd.description,
            json_schema,
            cmd.recommended_models,
        );

        // Creating a definition forces the conversation completed, as one
        // unit with the insert.
        conversation.complete();
        self.task_definitions
            .create(&definition, &conversation)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict => CreateTaskDefinitionError::AlreadyExists,
                other => CreateTaskDefinitionError::Repository(other.to_string()),
            })?;

        Ok(definition)
    }
}
