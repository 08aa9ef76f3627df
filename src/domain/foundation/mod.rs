//! Foundation value objects shared across the domain.

mod auth;
mod ids;
mod timestamp;

pub use auth::AuthenticatedUser;
pub use ids::{ConversationId, MessageId, TaskDefinitionId, UserId};
pub use timestamp::Timestamp;
