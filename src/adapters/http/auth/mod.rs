//! HTTP endpoints for registration, login, and the current user.

mod dto;
mod handlers;
mod routes;

pub use dto::{LoginRequest, RegisterRequest, TokenResponse, UserView};
pub use handlers::AuthAppState;
pub use routes::routes;
