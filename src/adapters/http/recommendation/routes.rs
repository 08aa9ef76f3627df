//! Axum routes for recommendation endpoints.

use axum::routing::post;
use axum::Router;

use super::handlers::{recommend_models, RecommendationAppState};

/// Creates routes for recommendation endpoints.
///
/// - POST /recommend - Recommend hub models for a task definition
pub fn routes(state: RecommendationAppState) -> Router {
    Router::new()
        .route("/recommend", post(recommend_models))
        .with_state(state)
}
