//! User domain - registered account records.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId};

/// A registered user account.
///
/// The password is stored only as a bcrypt hash; the plaintext never
/// reaches the domain layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub last_login_at: Option<Timestamp>,
}

impl User {
    /// Creates a new active user with the given hashed password.
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>, full_name: Option<String>) -> Self {
        Self {
            id: UserId::new(),
            email: email.into(),
            password_hash: password_hash.into(),
            full_name,
            is_active: true,
            created_at: Timestamp::now(),
            last_login_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_is_active_with_no_login() {
        let user = User::new("a@example.com", "$2b$12$hash", None);
        assert!(user.is_active);
        assert!(user.last_login_at.is_none());
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let user = User::new("a@example.com", "$2b$12$hash", Some("Ada".to_string()));
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("$2b$12$hash"));
        assert!(json.contains("a@example.com"));
    }
}
