//! OpenAI provider - implementation of AIProvider for OpenAI's chat API.
//!
//! Streaming uses Server-Sent Events: the response body is a sequence of
//! `data:` lines that can be split across transport chunks, so incoming
//! bytes are line-buffered before parsing. Each parsed event is yielded
//! as a `StreamChunk` until the `[DONE]` marker arrives.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::AiConfig;
use crate::ports::{
    AIError, AIProvider, ChunkStream, CompletionRequest, CompletionResponse, FinishReason,
    ProviderInfo, StreamChunk, TokenUsage,
};

/// Configuration for the OpenAI provider.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use.
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries on transient failures (non-streaming only).
    pub max_retries: u32,
}

impl OpenAIConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(120),
            max_retries: 3,
        }
    }

    /// Builds a provider configuration from the application config.
    pub fn from_app_config(config: &AiConfig) -> Self {
        let mut provider_config = Self::new(config.openai_api_key().unwrap_or_default());
        provider_config.model = config.model.clone();
        provider_config.base_url = config.base_url.clone();
        provider_config.timeout = config.timeout();
        provider_config.max_retries = config.max_retries;
        provider_config
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI chat-completions provider.
pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIProvider {
    /// Creates a new provider with the given configuration.
    pub fn new(config: OpenAIConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn to_wire_request(&self, request: &CompletionRequest, stream: bool) -> ChatRequest {
        let mut messages = Vec::new();

        if let Some(ref prompt) = request.system_prompt {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: prompt.clone(),
            });
        }

        for msg in &request.messages {
            messages.push(ChatMessage {
                role: msg.role.as_str().to_string(),
                content: msg.content.clone(),
            });
        }

        ChatRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: stream.then_some(true),
            stream_options: stream.then_some(StreamOptions {
                include_usage: true,
            }),
        }
    }

    async fn send_request(
        &self,
        request: &CompletionRequest,
        stream: bool,
    ) -> Result<Response, AIError> {
        let wire_request = self.to_wire_request(request, stream);

        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
            .json(&wire_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AIError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    AIError::network(format!("Connection failed: {}", e))
                } else {
                    AIError::network(e.to_string())
                }
            })?;

        self.check_status(response).await
    }

    async fn check_status(&self, response: Response) -> Result<Response, AIError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 => Err(AIError::AuthenticationFailed),
            429 => Err(AIError::rate_limited(parse_retry_after(&error_body))),
            400 => Err(AIError::InvalidRequest(error_body)),
            500..=599 => Err(AIError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(AIError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    async fn parse_response(&self, response: Response) -> Result<CompletionResponse, AIError> {
        let wire_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

        let choice = wire_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AIError::parse("No choices in response"))?;

        let usage = wire_response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(CompletionResponse {
            content: choice.message.content,
            usage,
            model: wire_response.model,
            finish_reason: parse_finish_reason(choice.finish_reason.as_deref()),
        })
    }
}

#[async_trait]
impl AIProvider for OpenAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let mut last_error = AIError::network("No attempts made");

        for attempt in 0..=self.config.max_retries {
            match self.send_request(&request, false).await {
                Ok(response) => return self.parse_response(response).await,
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    // Exponential backoff: 1s, 2s, 4s, ...
                    sleep(Duration::from_secs(1 << attempt)).await;
                    last_error = err;
                }
                Err(err) => return Err(err),
            }
        }

        Err(last_error)
    }

    async fn stream_complete(&self, request: CompletionRequest) -> Result<ChunkStream, AIError> {
        let response = self.send_request(&request, true).await?;

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| AIError::network(format!("Stream error: {}", e))))
            .scan(String::new(), |buffer, chunk| {
                let events = match chunk {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));
                        drain_sse_events(buffer)
                    }
                    Err(e) => vec![Err(e)],
                };
                futures::future::ready(Some(events))
            })
            .flat_map(stream::iter);

        Ok(Box::pin(stream))
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("openai", &self.config.model)
    }
}

/// Parses all complete SSE lines buffered so far; partial trailing lines
/// stay in the buffer for the next transport chunk.
fn drain_sse_events(buffer: &mut String) -> Vec<Result<StreamChunk, AIError>> {
    let mut results = Vec::new();

    while let Some(newline) = buffer.find('\n') {
        let line: String = buffer.drain(..=newline).collect();
        let line = line.trim_end();

        let Some(data) = line.strip_prefix("data: ") else {
            continue;
        };
        if data == "[DONE]" {
            // End of stream; the finish reason already arrived in the
            // last data event.
            continue;
        }

        match serde_json::from_str::<ChatStreamEvent>(data) {
            Ok(event) => {
                if let Some(choice) = event.choices.first() {
                    if let Some(ref content) = choice.delta.content {
                        if !content.is_empty() {
                            results.push(Ok(StreamChunk::content(content)));
                        }
                    }

                    if let Some(ref reason) = choice.finish_reason {
                        let usage = event
                            .usage
                            .as_ref()
                            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens));
                        results.push(Ok(StreamChunk::final_chunk(
                            parse_finish_reason(Some(reason)),
                            usage,
                        )));
                    }
                }
            }
            Err(e) => {
                if !data.trim().is_empty() {
                    results.push(Err(AIError::parse(format!(
                        "Failed to parse SSE event: {}",
                        e
                    ))));
                }
            }
        }
    }

    results
}

fn parse_finish_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("length") => FinishReason::Length,
        Some("content_filter") => FinishReason::ContentFilter,
        _ => FinishReason::Stop,
    }
}

/// Parses retry-after seconds out of a rate limit error body.
fn parse_retry_after(error_body: &str) -> u32 {
    if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(error_body) {
        if let Some(msg) = parsed
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            if let Some(idx) = msg.find("try again in ") {
                let rest = &msg[idx + 13..];
                if let Some(num_end) = rest.find(|c: char| !c.is_ascii_digit()) {
                    if let Ok(secs) = rest[..num_end].parse::<u32>() {
                        return secs;
                    }
                }
            }
        }
    }
    30
}

// ----- OpenAI wire types -----

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_options: Option<StreamOptions>,
}

#[derive(Debug, Serialize)]
struct StreamOptions {
    include_usage: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatStreamEvent {
    choices: Vec<ChatStreamChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatStreamChoice {
    delta: ChatStreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatStreamDelta {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::MessageRole;

    #[test]
    fn config_builder_works() {
        let config = OpenAIConfig::new("test-key")
            .with_model("gpt-4o")
            .with_base_url("https://custom.api.com");

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.base_url, "https://custom.api.com");
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn wire_request_places_system_prompt_first() {
        let provider = OpenAIProvider::new(OpenAIConfig::new("test"));
        let request = CompletionRequest::new()
            .with_system_prompt("Be helpful")
            .with_message(MessageRole::User, "Hi");

        let wire = provider.to_wire_request(&request, false);
        assert_eq!(wire.messages[0].role, "system");
        assert_eq!(wire.messages[0].content, "Be helpful");
        assert_eq!(wire.messages[1].role, "user");
        assert!(wire.stream.is_none());
        assert!(wire.stream_options.is_none());
    }

    #[test]
    fn wire_request_enables_usage_when_streaming() {
        let provider = OpenAIProvider::new(OpenAIConfig::new("test"));
        let request = CompletionRequest::new().with_message(MessageRole::User, "Hi");

        let wire = provider.to_wire_request(&request, true);
        assert_eq!(wire.stream, Some(true));
        assert!(wire.stream_options.is_some());
    }

    #[test]
    fn drains_content_event() {
        let mut buffer =
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"},\"finish_reason\":null}]}\n"
                .to_string();
        let events = drain_sse_events(&mut buffer);

        assert_eq!(events.len(), 1);
        let chunk = events[0].as_ref().unwrap();
        assert_eq!(chunk.delta, "Hello");
        assert!(!chunk.is_final());
        assert!(buffer.is_empty());
    }

    #[test]
    fn drains_final_event_with_usage() {
        let mut buffer = "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}],\"usage\":{\"prompt_tokens\":10,\"completion_tokens\":5}}\n".to_string();
        let events = drain_sse_events(&mut buffer);

        assert_eq!(events.len(), 1);
        let chunk = events[0].as_ref().unwrap();
        assert!(chunk.is_final());
        assert_eq!(chunk.finish_reason, Some(FinishReason::Stop));
        assert_eq!(chunk.usage, Some(TokenUsage::new(10, 5)));
    }

    #[test]
    fn partial_line_stays_buffered() {
        let mut buffer = "data: {\"choices\":[{\"delta\":{\"con".to_string();
        let events = drain_sse_events(&mut buffer);

        assert!(events.is_empty());
        assert_eq!(buffer, "data: {\"choices\":[{\"delta\":{\"con");

        // The rest of the line arrives in the next transport chunk.
        buffer.push_str("tent\":\"Hi\"},\"finish_reason\":null}]}\n");
        let events = drain_sse_events(&mut buffer);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap().delta, "Hi");
    }

    #[test]
    fn done_marker_produces_no_event() {
        let mut buffer = "data: [DONE]\n".to_string();
        assert!(drain_sse_events(&mut buffer).is_empty());
    }

    #[test]
    fn multiple_events_in_one_chunk_stay_ordered() {
        let mut buffer = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"A\"},\"finish_reason\":null}]}\n",
            "\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"B\"},\"finish_reason\":null}]}\n",
        )
        .to_string();
        let events = drain_sse_events(&mut buffer);

        let deltas: Vec<&str> = events
            .iter()
            .map(|e| e.as_ref().unwrap().delta.as_str())
            .collect();
        assert_eq!(deltas, vec!["A", "B"]);
    }

    #[test]
    fn malformed_event_yields_parse_error() {
        let mut buffer = "data: {not json}\n".to_string();
        let events = drain_sse_events(&mut buffer);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Err(AIError::Parse(_))));
    }

    #[test]
    fn parse_retry_after_from_message() {
        let error = r#"{"error":{"message":"Rate limit exceeded. Please try again in 30 seconds."}}"#;
        assert_eq!(parse_retry_after(error), 30);
    }

    #[test]
    fn parse_retry_after_default() {
        assert_eq!(parse_retry_after(r#"{"error":{"message":"oops"}}"#), 30);
    }

    #[test]
    fn finish_reason_mapping() {
        assert_eq!(parse_finish_reason(Some("stop")), FinishReason::Stop);
        assert_eq!(parse_finish_reason(Some("length")), FinishReason::Length);
        assert_eq!(
            parse_finish_reason(Some("content_filter")),
            FinishReason::ContentFilter
        );
        assert_eq!(parse_finish_reason(None), FinishReason::Stop);
    }
}
