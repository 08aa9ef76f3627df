//! HTTP handlers for task definition endpoints.

use std::sync::Arc;

use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::adapters::http::middleware::RequireAuth;
use crate::application::handlers::task_definition::{
    CreateTaskDefinitionCommand, CreateTaskDefinitionError, CreateTaskDefinitionHandler,
};
use crate::domain::foundation::TaskDefinitionId;
use crate::ports::TaskDefinitionRepository;

use super::dto::{CreateTaskDefinitionRequest, ListParams, TaskDefinitionView};

/// Shared application state for task definition handlers.
#[derive(Clone)]
pub struct TaskDefinitionAppState {
    pub task_definitions: Arc<dyn TaskDefinitionRepository>,
    pub create_handler: Arc<CreateTaskDefinitionHandler>,
}

impl TaskDefinitionAppState {
    /// Creates a new TaskDefinitionAppState.
    pub fn new(
        task_definitions: Arc<dyn TaskDefinitionRepository>,
        create_handler: Arc<CreateTaskDefinitionHandler>,
    ) -> Self {
        Self {
            task_definitions,
            create_handler,
        }
    }
}

/// POST / - Create a task definition from a conversation.
///
/// # Errors
/// - 400 Bad Request: malformed ids, no assistant message, or extraction
///   failure (the cause is named in the response)
/// - 404 Not Found: unknown conversation, or owned by someone else
/// - 409 Conflict: a task definition already exists for the conversation
pub async fn create_task_definition(
    State(state): State<TaskDefinitionAppState>,
    RequireAuth(caller): RequireAuth,
    Json(request): Json<CreateTaskDefinitionRequest>,
) -> Result<impl IntoResponse, TaskDefinitionApiError> {
    let conversation_id = request.conversation_id.parse().map_err(|_| {
        TaskDefinitionApiError::BadRequest("Invalid conversation ID format".to_string())
    })?;
    if request.name.trim().is_empty() {
        return Err(TaskDefinitionApiError::BadRequest(
            "Name cannot be empty".to_string(),
        ));
    }

    let definition = state
        .create_handler
        .handle(CreateTaskDefinitionCommand {
            conversation_id,
            user_id: caller.id,
            name: request.name,
            description: request.description,
            json_schema: request.json_schema,
            recommended_models: request.recommended_models,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(TaskDefinitionView::from(&definition))))
}

/// GET / - List the caller's task definitions, newest first.
pub async fn list_task_definitions(
    State(state): State<TaskDefinitionAppState>,
    RequireAuth(caller): RequireAuth,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, TaskDefinitionApiError> {
    let definitions = state
        .task_definitions
        .list_for_user(caller.id, params.effective_skip(), params.effective_limit())
        .await
        .map_err(|e| TaskDefinitionApiError::Internal(e.to_string()))?;

    let views: Vec<TaskDefinitionView> =
        definitions.iter().map(TaskDefinitionView::from).collect();
    Ok((StatusCode::OK, Json(views)))
}

/// GET /:id - Fetch one task definition.
///
/// # Errors
/// - 404 Not Found: unknown definition, or owned by someone else
pub async fn get_task_definition(
    State(state): State<TaskDefinitionAppState>,
    RequireAuth(caller): RequireAuth,
    Path(task_id): Path<String>,
) -> Result<impl IntoResponse, TaskDefinitionApiError> {
    let task_id = parse_task_id(&task_id)?;

    let definition = state
        .task_definitions
        .find_for_user(task_id, caller.id)
        .await
        .map_err(|e| TaskDefinitionApiError::Internal(e.to_string()))?
        .ok_or(TaskDefinitionApiError::NotFound)?;

    Ok((StatusCode::OK, Json(TaskDefinitionView::from(&definition))))
}

/// DELETE /:id - Delete a task definition.
///
/// # Errors
/// - 404 Not Found: unknown definition, or owned by someone else
pub async fn delete_task_definition(
    State(state): State<TaskDefinitionAppState>,
    RequireAuth(caller): RequireAuth,
    Path(task_id): Path<String>,
) -> Result<impl IntoResponse, TaskDefinitionApiError> {
    let task_id = parse_task_id(&task_id)?;

    state
        .task_definitions
        .delete(task_id, caller.id)
        .await
        .map_err(|e| match e {
            crate::ports::RepositoryError::NotFound => TaskDefinitionApiError::NotFound,
            other => TaskDefinitionApiError::Internal(other.to_string()),
        })?;

    Ok(StatusCode::NO_CONTENT)
}

fn parse_task_id(raw: &str) -> Result<TaskDefinitionId, TaskDefinitionApiError> {
    raw.parse()
        .map_err(|_| TaskDefinitionApiError::BadRequest("Invalid task definition ID format".to_string()))
}

/// API error type for task definition endpoints.
#[derive(Debug)]
pub enum TaskDefinitionApiError {
    BadRequest(String),
    NotFound,
    Conflict,
    Internal(String),
}

impl From<CreateTaskDefinitionError> for TaskDefinitionApiError {
    fn from(error: CreateTaskDefinitionError) -> Self {
        match error {
            CreateTaskDefinitionError::ConversationNotFound => TaskDefinitionApiError::NotFound,
            CreateTaskDefinitionError::AlreadyExists => TaskDefinitionApiError::Conflict,
            CreateTaskDefinitionError::NoAssistantMessage => TaskDefinitionApiError::BadRequest(
                "No AI response found in conversation".to_string(),
            ),
            CreateTaskDefinitionError::Extraction(cause) => TaskDefinitionApiError::BadRequest(
                format!("No valid JSON schema found in conversation: {}", cause),
            ),
            CreateTaskDefinitionError::Repository(message) => {
                TaskDefinitionApiError::Internal(message)
            }
        }
    }
}

impl IntoResponse for TaskDefinitionApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match self {
            TaskDefinitionApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
            }
            TaskDefinitionApiError::NotFound => (
                StatusCode::NOT_FOUND,
                "TASK_DEFINITION_NOT_FOUND",
                "Task definition or conversation not found".to_string(),
            ),
            TaskDefinitionApiError::Conflict => (
                StatusCode::CONFLICT,
                "TASK_DEFINITION_EXISTS",
                "Task definition already exists for this conversation".to_string(),
            ),
            TaskDefinitionApiError::Internal(message) => {
                tracing::error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        (
            status,
            Json(serde_json::json!({ "code": code, "message": message })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::ExtractionError;

    #[test]
    fn create_errors_map_to_http_semantics() {
        assert!(matches!(
            TaskDefinitionApiError::from(CreateTaskDefinitionError::ConversationNotFound),
            TaskDefinitionApiError::NotFound
        ));
        assert!(matches!(
            TaskDefinitionApiError::from(CreateTaskDefinitionError::AlreadyExists),
            TaskDefinitionApiError::Conflict
        ));
        assert!(matches!(
            TaskDefinitionApiError::from(CreateTaskDefinitionError::NoAssistantMessage),
            TaskDefinitionApiError::BadRequest(_)
        ));
        assert!(matches!(
            TaskDefinitionApiError::from(CreateTaskDefinitionError::Extraction(
                ExtractionError::NoFencedBlock
            )),
            TaskDefinitionApiError::BadRequest(_)
        ));
    }

    #[test]
    fn extraction_error_names_the_cause() {
        let TaskDefinitionApiError::BadRequest(message) = TaskDefinitionApiError::from(
            CreateTaskDefinitionError::Extraction(ExtractionError::NoFencedBlock),
        ) else {
            panic!("expected BadRequest");
        };
        assert!(message.contains("no fenced json block"));
    }
}
