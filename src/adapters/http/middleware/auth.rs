//! Authentication middleware and extractors for axum.
//!
//! This module provides:
//! - `JwtAuth` - HS256 token issuance and verification
//! - `auth_middleware` - Layer that validates Bearer tokens and injects the
//!   caller identity into request extensions
//! - `RequireAuth` - Extractor that requires authentication
//!
//! ```text
//! Request -> auth_middleware -> injects AuthenticatedUser into extensions
//!                                      |
//!                              Handler -> RequireAuth extractor reads from extensions
//! ```

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthConfig;
use crate::domain::foundation::{AuthenticatedUser, Timestamp, UserId};

/// Errors from token issuance or verification.
#[derive(Debug, Clone, Error)]
pub enum AuthTokenError {
    #[error("token expired")]
    Expired,

    #[error("invalid token")]
    Invalid,
}

/// JWT claims carried in access tokens.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject: the user id.
    sub: String,
    /// Expiry as Unix seconds.
    exp: u64,
}

/// HS256 token issuer and verifier.
pub struct JwtAuth {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry_minutes: i64,
}

impl JwtAuth {
    /// Creates a new issuer/verifier from the auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            expiry_minutes: config.token_expiry_minutes,
        }
    }

    /// Issues an access token for the given user.
    pub fn issue(&self, user_id: UserId) -> Result<String, AuthTokenError> {
        let claims = Claims {
            sub: user_id.to_string(),
            exp: Timestamp::now()
                .plus_minutes(self.expiry_minutes)
                .as_unix_secs(),
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(|_| AuthTokenError::Invalid)
    }

    /// Verifies a token and returns the caller identity.
    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthTokenError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthTokenError::Expired,
                _ => AuthTokenError::Invalid,
            }
        })?;

        let user_id = UserId::from_str(&data.claims.sub).map_err(|_| AuthTokenError::Invalid)?;
        Ok(AuthenticatedUser::new(user_id))
    }
}

/// Authentication middleware that validates Bearer tokens.
///
/// On a valid token, injects `AuthenticatedUser` into request extensions;
/// with no token, continues without injecting so public routes keep
/// working and `RequireAuth` rejects later; on an invalid token, returns
/// 401 immediately.
pub async fn auth_middleware(
    State(auth): State<Arc<JwtAuth>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    match token {
        Some(token) => match auth.verify(token) {
            Ok(user) => {
                request.extensions_mut().insert(user);
                next.run(request).await
            }
            Err(e) => {
                let message = match e {
                    AuthTokenError::Expired => "Token expired",
                    AuthTokenError::Invalid => "Invalid token",
                };
                (
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({
                        "code": "AUTH_ERROR",
                        "message": message,
                    })),
                )
                    .into_response()
            }
        },
        None => next.run(request).await,
    }
}

/// Extractor that requires an authenticated caller.
///
/// Returns 401 when the auth middleware did not inject an identity.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(RequireAuth)
            .ok_or(AuthRejection::Unauthenticated)
    }
}

/// Rejection type for authentication failures.
#[derive(Debug, Clone)]
pub enum AuthRejection {
    /// No valid authentication token was provided.
    Unauthenticated,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "code": "AUTH_ERROR",
                "message": "Authentication required",
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn jwt() -> JwtAuth {
        JwtAuth::new(&AuthConfig {
            jwt_secret: Secret::new("a-long-enough-test-secret".to_string()),
            token_expiry_minutes: 60,
            invitation_codes: String::new(),
        })
    }

    #[test]
    fn issued_token_verifies_to_same_user() {
        let auth = jwt();
        let user_id = UserId::new();

        let token = auth.issue(user_id).unwrap();
        let verified = auth.verify(&token).unwrap();
        assert_eq!(verified.id, user_id);
    }

    #[test]
    fn garbage_token_is_invalid() {
        let auth = jwt();
        assert!(matches!(
            auth.verify("not.a.token"),
            Err(AuthTokenError::Invalid)
        ));
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let issuer = JwtAuth::new(&AuthConfig {
            jwt_secret: Secret::new("a-completely-different-secret".to_string()),
            token_expiry_minutes: 60,
            invitation_codes: String::new(),
        });
        let token = issuer.issue(UserId::new()).unwrap();

        assert!(jwt().verify(&token).is_err());
    }
}
