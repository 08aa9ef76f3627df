//! Authenticated caller identity.

use super::UserId;

/// Identity established by the auth middleware for the current request.
///
/// Carries only what handlers need to enforce ownership; the full user
/// record stays in the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// The authenticated user's id (JWT subject).
    pub id: UserId,
}

impl AuthenticatedUser {
    /// Creates an authenticated identity for the given user.
    pub fn new(id: UserId) -> Self {
        Self { id }
    }
}
