//! Axum routes for auth endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{login, me, register, AuthAppState};

/// Creates routes for auth endpoints.
///
/// - POST /register - Create an account
/// - POST /login - Exchange credentials for a token
/// - GET /me - Current user
pub fn routes(state: AuthAppState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
        .with_state(state)
}
