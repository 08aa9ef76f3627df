//! Axum routes for task definition endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{
    create_task_definition, delete_task_definition, get_task_definition, list_task_definitions,
    TaskDefinitionAppState,
};

/// Creates routes for task definition endpoints.
///
/// - POST / - Create a task definition from a conversation
/// - GET / - List the caller's task definitions
/// - GET /:task_id - Fetch one task definition
/// - DELETE /:task_id - Delete a task definition
pub fn routes(state: TaskDefinitionAppState) -> Router {
    Router::new()
        .route("/", post(create_task_definition).get(list_task_definitions))
        .route(
            "/:task_id",
            get(get_task_definition).delete(delete_task_definition),
        )
        .with_state(state)
}
