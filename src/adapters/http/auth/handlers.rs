//! HTTP handlers for auth endpoints.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::adapters::http::middleware::{JwtAuth, RequireAuth};
use crate::domain::foundation::Timestamp;
use crate::domain::user::User;
use crate::ports::{RepositoryError, UserRepository};

use super::dto::{LoginRequest, RegisterRequest, TokenResponse, UserView};

/// Shared application state for auth handlers.
#[derive(Clone)]
pub struct AuthAppState {
    pub users: Arc<dyn UserRepository>,
    pub jwt: Arc<JwtAuth>,
    /// Invitation codes accepted at registration.
    pub invitation_codes: Vec<String>,
}

impl AuthAppState {
    /// Creates a new AuthAppState.
    pub fn new(users: Arc<dyn UserRepository>, jwt: Arc<JwtAuth>, invitation_codes: Vec<String>) -> Self {
        Self {
            users,
            jwt,
            invitation_codes,
        }
    }
}

/// POST /api/v1/auth/register - Register a new account.
///
/// # Errors
/// - 400 Bad Request: invalid email, weak password, bad invitation code,
///   or email already registered
pub async fn register(
    State(state): State<AuthAppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthApiError> {
    if !request.email.contains('@') {
        return Err(AuthApiError::BadRequest("Invalid email address".to_string()));
    }
    if request.password.len() < 8 {
        return Err(AuthApiError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    if !state.invitation_codes.contains(&request.invitation_code) {
        return Err(AuthApiError::BadRequest(
            "Invalid invitation code. Registration requires a valid invitation code.".to_string(),
        ));
    }

    if state
        .users
        .find_by_email(&request.email)
        .await
        .map_err(|e| AuthApiError::Internal(e.to_string()))?
        .is_some()
    {
        return Err(AuthApiError::BadRequest(
            "A user with this email already exists.".to_string(),
        ));
    }

    // bcrypt is CPU-bound; keep it off the async executor.
    let password = request.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| AuthApiError::Internal(e.to_string()))?
        .map_err(|e| AuthApiError::Internal(e.to_string()))?;

    let user = User::new(request.email, password_hash, request.full_name);
    state.users.create(&user).await.map_err(|e| match e {
        RepositoryError::Conflict => {
            AuthApiError::BadRequest("A user with this email already exists.".to_string())
        }
        other => AuthApiError::Internal(other.to_string()),
    })?;

    Ok((StatusCode::CREATED, Json(UserView::from(&user))))
}

/// POST /api/v1/auth/login - Exchange credentials for an access token.
///
/// # Errors
/// - 401 Unauthorized: unknown email or wrong password
/// - 400 Bad Request: inactive account
pub async fn login(
    State(state): State<AuthAppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthApiError> {
    let user = state
        .users
        .find_by_email(&request.email)
        .await
        .map_err(|e| AuthApiError::Internal(e.to_string()))?
        .ok_or(AuthApiError::InvalidCredentials)?;

    let password = request.password.clone();
    let hash = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AuthApiError::Internal(e.to_string()))?
        .map_err(|e| AuthApiError::Internal(e.to_string()))?;

    if !verified {
        return Err(AuthApiError::InvalidCredentials);
    }
    if !user.is_active {
        return Err(AuthApiError::BadRequest("Inactive user".to_string()));
    }

    state
        .users
        .record_login(user.id, Timestamp::now())
        .await
        .map_err(|e| AuthApiError::Internal(e.to_string()))?;

    let token = state
        .jwt
        .issue(user.id)
        .map_err(|e| AuthApiError::Internal(e.to_string()))?;

    Ok((StatusCode::OK, Json(TokenResponse::bearer(token))))
}

/// GET /api/v1/auth/me - Current user.
///
/// # Errors
/// - 401 Unauthorized: no valid auth token
pub async fn me(
    State(state): State<AuthAppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<impl IntoResponse, AuthApiError> {
    let user = state
        .users
        .find_by_id(caller.id)
        .await
        .map_err(|e| AuthApiError::Internal(e.to_string()))?
        .ok_or(AuthApiError::InvalidCredentials)?;

    Ok((StatusCode::OK, Json(UserView::from(&user))))
}

/// API error type for auth endpoints.
#[derive(Debug)]
pub enum AuthApiError {
    BadRequest(String),
    InvalidCredentials,
    Internal(String),
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match self {
            AuthApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
            }
            AuthApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Incorrect email or password".to_string(),
            ),
            AuthApiError::Internal(message) => {
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
