//! Two-stage model recommendation.
//!
//! Stage 1 asks the AI backend to distill a task definition into search
//! keywords; stage 2 forwards those keywords to the model hub. The hub's
//! ordering is returned unchanged - ranking is the hub's business, not
//! ours.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::conversation::MessageRole;
use crate::ports::{AIProvider, CompletionRequest, ModelCard, ModelSearch, ModelSearchError};

/// How many candidate models a recommendation returns.
const RECOMMENDATION_LIMIT: u32 = 5;
/// Token cap for the keyword extraction completion.
const KEYWORD_MAX_TOKENS: u32 = 50;
/// Keyword extraction should be near-deterministic.
const KEYWORD_TEMPERATURE: f32 = 0.2;

/// Prompt asking the backend for hub search keywords.
const KEYWORD_PROMPT: &str = "\
You are an expert model curator. Analyze the following task definition \
(JSON) and produce precise, relevant keywords for searching a model hub: \
consider the task, language, domain, and performance requirements. Output \
the keywords as a single comma-separated string and nothing else.";

/// Errors from model recommendation.
#[derive(Debug, Clone, Error)]
pub enum RecommendModelsError {
    /// Keyword extraction failed at the AI backend.
    #[error("keyword extraction failed: {0}")]
    Backend(String),

    /// The hub lookup failed.
    #[error("model hub lookup failed: {0}")]
    Hub(#[from] ModelSearchError),
}

/// Handler for model recommendations.
pub struct RecommendModelsHandler {
    provider: Arc<dyn AIProvider>,
    hub: Arc<dyn ModelSearch>,
}

impl RecommendModelsHandler {
    /// Creates a new handler.
    pub fn new(provider: Arc<dyn AIProvider>, hub: Arc<dyn ModelSearch>) -> Self {
        Self { provider, hub }
    }

    /// Recommends models for a task definition schema.
    pub async fn handle(
        &self,
        task_definition: &serde_json::Value,
    ) -> Result<Vec<ModelCard>, RecommendModelsError> {
        let request = CompletionRequest::new()
            .with_system_prompt(KEYWORD_PROMPT)
            .with_message(MessageRole::User, task_definition.to_string())
            .with_max_tokens(KEYWORD_MAX_TOKENS)
            .with_temperature(KEYWORD_TEMPERATURE);

        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| RecommendModelsError::Backend(e.to_string()))?;
        let keywords = response.content.trim().to_string();

        Ok(self.hub.search(&keywords, RECOMMENDATION_LIMIT).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::conversation::test_support::ScriptedProvider;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct RecordingHub {
        queries: Mutex<Vec<(String, u32)>>,
        results: Vec<ModelCard>,
    }

    impl RecordingHub {
        fn returning(results: Vec<ModelCard>) -> Self {
            Self {
                queries: Mutex::new(Vec::new()),
                results,
            }
        }
    }

    #[async_trait]
    impl ModelSearch for RecordingHub {
        async fn search(
            &self,
            keywords: &str,
            limit: u32,
        ) -> Result<Vec<ModelCard>, ModelSearchError> {
            self.queries
                .lock()
                .unwrap()
                .push((keywords.to_string(), limit));
            Ok(self.results.clone())
        }
    }

    fn card(model_id: &str, likes: u64) -> ModelCard {
        ModelCard {
            model_id: model_id.to_string(),
            tags: vec!["text-classification".to_string()],
            downloads: 1000,
            likes,
        }
    }

    #[tokio::test]
    async fn forwards_extracted_keywords_to_hub() {
        let provider = ScriptedProvider::completing(Ok(
            " text classification, sentiment, english \n".to_string()
        ));
        let hub = Arc::new(RecordingHub::returning(vec![card("a/b", 10)]));
        let handler = RecommendModelsHandler::new(Arc::new(provider), Arc::clone(&hub) as _);

        let results = handler
            .handle(&json!({"task_type": "classification", "language": "en"}))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        let queries = hub.queries.lock().unwrap();
        assert_eq!(
            queries[0],
            ("text classification, sentiment, english".to_string(), 5)
        );
    }

    #[tokio::test]
    async fn hub_ordering_is_passed_through() {
        let provider = ScriptedProvider::completing(Ok("keywords".to_string()));
        // Deliberately not sorted by likes: the hub's order is preserved.
        let hub = Arc::new(RecordingHub::returning(vec![
            card("low/likes", 1),
            card("high/likes", 100),
        ]));
        let handler = RecommendModelsHandler::new(Arc::new(provider), hub as _);

        let results = handler.handle(&json!({})).await.unwrap();
        assert_eq!(results[0].model_id, "low/likes");
        assert_eq!(results[1].model_id, "high/likes");
    }

    #[tokio::test]
    async fn backend_failure_surfaces() {
        let provider = ScriptedProvider::completing(Err(
            crate::ports::AIError::unavailable("down"),
        ));
        let hub = Arc::new(RecordingHub::returning(vec![]));
        let handler = RecommendModelsHandler::new(Arc::new(provider), hub as _);

        let result = handler.handle(&json!({})).await;
        assert!(matches!(result, Err(RecommendModelsError::Backend(_))));
    }
}
