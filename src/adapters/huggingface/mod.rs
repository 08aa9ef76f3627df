//! Hugging Face Hub adapter for the ModelSearch port.
//!
//! Forwards keyword queries to the hub's `/api/models` endpoint, sorted
//! by likes, and maps the results into `ModelCard`s without re-ranking.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use crate::config::AiConfig;
use crate::ports::{ModelCard, ModelSearch, ModelSearchError};

/// Model search client backed by the Hugging Face Hub API.
pub struct HuggingFaceSearch {
    client: Client,
    base_url: String,
    token: Option<Secret<String>>,
}

impl HuggingFaceSearch {
    /// Creates a new hub client.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            token: token.map(Secret::new),
        }
    }

    /// Builds a hub client from the application config.
    pub fn from_app_config(config: &AiConfig) -> Self {
        Self::new(
            config.hub_base_url.clone(),
            config.hub_token().map(str::to_string),
        )
    }

    fn models_url(&self) -> String {
        format!("{}/api/models", self.base_url)
    }
}

#[async_trait]
impl ModelSearch for HuggingFaceSearch {
    async fn search(&self, keywords: &str, limit: u32) -> Result<Vec<ModelCard>, ModelSearchError> {
        let limit = limit.to_string();
        let mut request = self.client.get(self.models_url()).query(&[
            ("search", keywords),
            ("sort", "likes"),
            ("direction", "-1"),
            ("limit", limit.as_str()),
        ]);

        if let Some(ref token) = self.token {
            request = request.header(
                "Authorization",
                format!("Bearer {}", token.expose_secret()),
            );
        }

        let response = request
            .send()
            .await
            .map_err(|e| ModelSearchError::Request(e.to_string()))?
            .error_for_status()
            .map_err(|e| ModelSearchError::Request(e.to_string()))?;

        let models: Vec<HubModel> = response
            .json()
            .await
            .map_err(|e| ModelSearchError::Parse(e.to_string()))?;

        Ok(models.into_iter().map(ModelCard::from).collect())
    }
}

/// Wire shape of a hub model listing entry.
#[derive(Debug, Deserialize)]
struct HubModel {
    #[serde(alias = "modelId")]
    id: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    downloads: u64,
    #[serde(default)]
    likes: u64,
}

impl From<HubModel> for ModelCard {
    fn from(model: HubModel) -> Self {
        ModelCard {
            model_id: model.id,
            tags: model.tags,
            downloads: model.downloads,
            likes: model.likes,
        }
    }
}
