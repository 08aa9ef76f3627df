//! HTTP endpoints for model recommendations.

mod dto;
mod handlers;
mod routes;

pub use dto::ModelRecommendationView;
pub use handlers::RecommendationAppState;
pub use routes::routes;
