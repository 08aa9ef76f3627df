//! Task Definition Repository Port.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::conversation::Conversation;
use crate::domain::foundation::{ConversationId, TaskDefinitionId, UserId};
use crate::domain::task_definition::TaskDefinition;

/// Port for task definition persistence.
#[async_trait]
pub trait TaskDefinitionRepository: Send + Sync {
    /// Atomically persists a new task definition and the forced
    /// completion of its parent conversation.
    ///
    /// Fails with [`RepositoryError::Conflict`] when a definition already
    /// exists for the conversation (the one-to-one invariant is also
    /// enforced by a unique constraint in the store).
    async fn create(
        &self,
        definition: &TaskDefinition,
        conversation: &Conversation,
    ) -> Result<(), RepositoryError>;

    /// Finds a task definition by id, scoped to its owner.
    async fn find_for_user(
        &self,
        id: TaskDefinitionId,
        user_id: UserId,
    ) -> Result<Option<TaskDefinition>, RepositoryError>;

    /// Finds the task definition attached to a conversation, if any.
    async fn find_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<TaskDefinition>, RepositoryError>;

    /// Lists a user's task definitions, newest first.
    async fn list_for_user(
        &self,
        user_id: UserId,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<TaskDefinition>, RepositoryError>;

    /// Deletes a task definition owned by the given user.
    ///
    /// Returns [`RepositoryError::NotFound`] when no matching row exists.
    async fn delete(&self, id: TaskDefinitionId, user_id: UserId) -> Result<(), RepositoryError>;
}
