//! HTTP endpoints for task definitions.

mod dto;
mod handlers;
mod routes;

pub use dto::{CreateTaskDefinitionRequest, TaskDefinitionView};
pub use handlers::TaskDefinitionAppState;
pub use routes::routes;
