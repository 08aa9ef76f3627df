//! HTTP handlers for recommendation endpoints.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::adapters::http::middleware::RequireAuth;
use crate::application::handlers::recommendation::{RecommendModelsError, RecommendModelsHandler};

use super::dto::ModelRecommendationView;

/// Shared application state for recommendation handlers.
#[derive(Clone)]
pub struct RecommendationAppState {
    pub recommender: Arc<RecommendModelsHandler>,
}

impl RecommendationAppState {
    /// Creates a new RecommendationAppState.
    pub fn new(recommender: Arc<RecommendModelsHandler>) -> Self {
        Self { recommender }
    }
}

/// POST /recommend - Recommend hub models for a task definition schema.
///
/// # Errors
/// - 401 Unauthorized: no valid auth token
/// - 502 Bad Gateway: AI backend or hub failure
pub async fn recommend_models(
    State(state): State<RecommendationAppState>,
    RequireAuth(_caller): RequireAuth,
    Json(task_definition): Json<serde_json::Value>,
) -> Result<impl IntoResponse, RecommendationApiError> {
    let cards = state.recommender.handle(&task_definition).await?;

    let views: Vec<ModelRecommendationView> =
        cards.iter().map(ModelRecommendationView::from).collect();
    Ok((StatusCode::OK, Json(views)))
}

/// API error type for recommendation endpoints.
#[derive(Debug)]
pub enum RecommendationApiError {
    BadGateway(String),
}

impl From<RecommendModelsError> for RecommendationApiError {
    fn from(error: RecommendModelsError) -> Self {
        RecommendationApiError::BadGateway(error.to_string())
    }
}

impl IntoResponse for RecommendationApiError {
    fn into_response(self) -> axum::response::Response {
        let RecommendationApiError::BadGateway(message) = self;
        tracing::warn!("Recommendation failure: {}", message);
        (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({
                "code": "MODEL_SEARCH_ERROR",
                "message": "Model recommendation failed",
            })),
        )
            .into_response()
    }
}
