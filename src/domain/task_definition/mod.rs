//! Task definition domain - the system's primary deliverable.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConversationId, TaskDefinitionId, Timestamp, UserId};

/// A finished task definition: the structured schema produced by a
/// completed conversation, plus naming metadata.
///
/// Exactly one task definition may exist per conversation. Once created
/// it is read-only except for deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub id: TaskDefinitionId,
    pub conversation_id: ConversationId,
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub json_schema: serde_json::Value,
    pub recommended_models: Option<Vec<String>>,
    pub created_at: Timestamp,
}

impl TaskDefinition {
    /// Creates a new task definition for a conversation.
    pub fn new(
        conversation_id: ConversationId,
        user_id: UserId,
        name: impl Into<String>,
        description: Option<String>,
        json_schema: serde_json::Value,
        recommended_models: Option<Vec<String>>,
    ) -> Self {
        Self {
            id: TaskDefinitionId::new(),
            conversation_id,
            user_id,
            name: name.into(),
            description,
            json_schema,
            recommended_models,
            created_at: Timestamp::now(),
        }
    }
}
