//! HTTP DTOs for task definition endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::task_definition::TaskDefinition;

/// Request to create a task definition from a conversation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskDefinitionRequest {
    pub conversation_id: String,
    pub name: String,
    pub description: Option<String>,
    /// Explicit schema; when omitted, the latest assistant message is
    /// mined for a fenced json block.
    pub json_schema: Option<serde_json::Value>,
    pub recommended_models: Option<Vec<String>>,
}

/// Query parameters for paginated listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub skip: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl ListParams {
    const DEFAULT_LIMIT: u32 = 20;
    const MAX_LIMIT: u32 = 100;

    pub fn effective_skip(&self) -> u32 {
        self.skip.unwrap_or(0)
    }

    pub fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .min(Self::MAX_LIMIT)
    }
}

/// View of a task definition.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinitionView {
    pub id: String,
    pub conversation_id: String,
    pub name: String,
    pub description: Option<String>,
    pub json_schema: serde_json::Value,
    pub recommended_models: Option<Vec<String>>,
    pub created_at: String,
}

impl From<&TaskDefinition> for TaskDefinitionView {
    fn from(definition: &TaskDefinition) -> Self {
        Self {
            id: definition.id.to_string(),
            conversation_id: definition.conversation_id.to_string(),
            name: definition.name.clone(),
            description: definition.description.clone(),
            json_schema: definition.json_schema.clone(),
            recommended_models: definition.recommended_models.clone(),
            created_at: definition.created_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{ConversationId, UserId};
    use serde_json::json;

    #[test]
    fn create_request_deserializes_with_optional_schema() {
        let json = r#"{
            "conversationId": "550e8400-e29b-41d4-a716-446655440000",
            "name": "Classifier"
        }"#;
        let request: CreateTaskDefinitionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.name, "Classifier");
        assert!(request.json_schema.is_none());
    }

    #[test]
    fn view_serializes_schema_verbatim() {
        let definition = TaskDefinition::new(
            ConversationId::new(),
            UserId::new(),
            "NER",
            None,
            json!({"task_type": "ner"}),
            Some(vec!["bert-base-cased".to_string()]),
        );
        let rendered = serde_json::to_value(TaskDefinitionView::from(&definition)).unwrap();
        assert_eq!(rendered["jsonSchema"]["task_type"], "ner");
        assert_eq!(rendered["recommendedModels"][0], "bert-base-cased");
    }
}
