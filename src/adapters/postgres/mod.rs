//! PostgreSQL adapters for the repository ports.

mod conversation_repository;
mod task_definition_repository;
mod user_repository;

pub use conversation_repository::PostgresConversationRepository;
pub use task_definition_repository::PostgresTaskDefinitionRepository;
pub use user_repository::PostgresUserRepository;

use crate::ports::RepositoryError;

/// Maps a sqlx error into a repository error, keeping unique-constraint
/// violations distinguishable as conflicts.
fn map_sqlx_error(context: &str, error: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_error) = error {
        if db_error.is_unique_violation() {
            return RepositoryError::Conflict;
        }
    }
    RepositoryError::Database(format!("{}: {}", context, error))
}
