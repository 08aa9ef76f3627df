//! HTTP DTOs for auth endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::user::User;

/// Request to register a new account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub invitation_code: String,
}

/// Request to exchange credentials for an access token.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// OAuth2-style bearer token response.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    /// Wraps an access token in the standard bearer envelope.
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// Public view of a user account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            is_active: user.is_active,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_deserializes_camel_case() {
        let json = r#"{
            "email": "a@example.com",
            "password": "hunter22",
            "fullName": "Ada",
            "invitationCode": "FORGE2024"
        }"#;
        let request: RegisterRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.full_name.as_deref(), Some("Ada"));
        assert_eq!(request.invitation_code, "FORGE2024");
    }

    #[test]
    fn token_response_uses_oauth_field_names() {
        let response = TokenResponse::bearer("abc".to_string());
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains(r#""access_token":"abc""#));
        assert!(json.contains(r#""token_type":"bearer""#));
    }

    #[test]
    fn user_view_omits_password_hash() {
        let user = User::new("a@example.com", "$2b$12$secret", None);
        let json = serde_json::to_string(&UserView::from(&user)).unwrap();
        assert!(!json.contains("secret"));
    }
}
