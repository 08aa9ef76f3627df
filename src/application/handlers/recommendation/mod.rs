//! Model recommendation.

mod recommend_models;

pub use recommend_models::{RecommendModelsError, RecommendModelsHandler};
