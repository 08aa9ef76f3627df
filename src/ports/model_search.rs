//! Model Search Port - external model hub lookup.
//!
//! The hub is an external collaborator: we forward search keywords and
//! return its results in its own ordering. Ranking is out of scope.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A candidate pre-trained model returned by the hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCard {
    /// Hub identifier, e.g. "distilbert-base-uncased".
    pub model_id: String,
    /// Hub tags (task, language, license, ...).
    pub tags: Vec<String>,
    /// Download count.
    pub downloads: u64,
    /// Like count.
    pub likes: u64,
}

/// Errors from model hub lookups.
#[derive(Debug, Clone, Error)]
pub enum ModelSearchError {
    #[error("hub request failed: {0}")]
    Request(String),

    #[error("hub response could not be parsed: {0}")]
    Parse(String),
}

/// Port for searching the model hub.
#[async_trait]
pub trait ModelSearch: Send + Sync {
    /// Searches the hub with free-text keywords.
    ///
    /// Results arrive in the hub's own ordering (sorted by likes) and are
    /// passed through unchanged.
    async fn search(&self, keywords: &str, limit: u32) -> Result<Vec<ModelCard>, ModelSearchError>;
}
