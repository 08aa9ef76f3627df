//! User Repository Port.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::user::User;

/// Port for user account persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persists a new user.
    ///
    /// Fails with [`RepositoryError::Conflict`] when the email is taken.
    async fn create(&self, user: &User) -> Result<(), RepositoryError>;

    /// Finds a user by email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    /// Finds a user by id.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Records a successful login.
    async fn record_login(&self, id: UserId, at: Timestamp) -> Result<(), RepositoryError>;
}
