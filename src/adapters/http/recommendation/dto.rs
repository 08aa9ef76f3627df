//! HTTP DTOs for recommendation endpoints.

use serde::Serialize;

use crate::ports::ModelCard;

/// One recommended model, as returned by the hub.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecommendationView {
    pub model_id: String,
    pub tags: Vec<String>,
    pub downloads: u64,
    pub likes: u64,
}

impl From<&ModelCard> for ModelRecommendationView {
    fn from(card: &ModelCard) -> Self {
        Self {
            model_id: card.model_id.clone(),
            tags: card.tags.clone(),
            downloads: card.downloads,
            likes: card.likes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_serializes_camel_case() {
        let card = ModelCard {
            model_id: "a/b".to_string(),
            tags: vec![],
            downloads: 1,
            likes: 2,
        };
        let json = serde_json::to_string(&ModelRecommendationView::from(&card)).unwrap();
        assert!(json.contains(r#""modelId":"a/b""#));
    }
}
