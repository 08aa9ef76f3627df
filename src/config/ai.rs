//! AI backend configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// AI backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// OpenAI API key
    pub openai_api_key: Option<Secret<String>>,

    /// Chat model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL for the chat completions API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries on transient failures (non-streaming requests only)
    #[serde(default = "default_retries")]
    pub max_retries: u32,

    /// Hugging Face Hub base URL for model search
    #[serde(default = "default_hub_url")]
    pub hub_base_url: String,

    /// Optional Hugging Face access token
    pub hub_token: Option<Secret<String>>,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Expose the OpenAI API key, if configured.
    pub fn openai_api_key(&self) -> Option<&str> {
        self.openai_api_key.as_ref().map(|k| k.expose_secret().as_str())
    }

    /// Expose the hub token, if configured.
    pub fn hub_token(&self) -> Option<&str> {
        self.hub_token.as_ref().map(|k| k.expose_secret().as_str())
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.openai_api_key() {
            Some(key) if !key.is_empty() => Ok(()),
            _ => Err(ValidationError::MissingRequired("AI__OPENAI_API_KEY")),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            hub_base_url: default_hub_url(),
            hub_token: None,
        }
    }
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_retries() -> u32 {
    3
}

fn default_hub_url() -> String {
    "https://huggingface.co".to_string()
}
