//! Mock AI provider for tests and local development.
//!
//! Configurable to return canned responses, stream them word by word, or
//! inject errors at a chosen point in the stream.

use async_trait::async_trait;
use futures::stream;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::ports::{
    AIError, AIProvider, ChunkStream, CompletionRequest, CompletionResponse, FinishReason,
    ProviderInfo, StreamChunk, TokenUsage,
};

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return this content, streamed word by word in streaming mode.
    Success(String),
    /// Stream the given chunks, then fail with the error.
    FailAfter(Vec<String>, AIError),
    /// Fail immediately.
    Error(AIError),
}

/// Mock AI provider consuming queued responses in order.
#[derive(Debug, Default)]
pub struct MockAIProvider {
    responses: Mutex<VecDeque<MockResponse>>,
}

impl MockAIProvider {
    /// Creates a provider with an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful response.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockResponse::Success(content.into()));
        self
    }

    /// Queues a stream that fails after emitting the given chunks.
    pub fn with_failure_after(self, chunks: Vec<String>, error: AIError) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockResponse::FailAfter(chunks, error));
        self
    }

    /// Queues an immediate error.
    pub fn with_error(self, error: AIError) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockResponse::Error(error));
        self
    }

    fn next_response(&self) -> MockResponse {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| MockResponse::Success("Tell me more about your task.".to_string()))
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        match self.next_response() {
            MockResponse::Success(content) => Ok(CompletionResponse {
                content,
                usage: TokenUsage::new(10, 20),
                model: "mock-1".to_string(),
                finish_reason: FinishReason::Stop,
            }),
            MockResponse::FailAfter(_, error) | MockResponse::Error(error) => Err(error),
        }
    }

    async fn stream_complete(&self, _request: CompletionRequest) -> Result<ChunkStream, AIError> {
        match self.next_response() {
            MockResponse::Success(content) => {
                let mut items: Vec<Result<StreamChunk, AIError>> = split_into_chunks(&content)
                    .into_iter()
                    .map(|piece| Ok(StreamChunk::content(piece)))
                    .collect();
                items.push(Ok(StreamChunk::final_chunk(
                    FinishReason::Stop,
                    Some(TokenUsage::new(10, 20)),
                )));
                Ok(Box::pin(stream::iter(items)))
            }
            MockResponse::FailAfter(chunks, error) => {
                let mut items: Vec<Result<StreamChunk, AIError>> = chunks
                    .into_iter()
                    .map(|piece| Ok(StreamChunk::content(piece)))
                    .collect();
                items.push(Err(error));
                Ok(Box::pin(stream::iter(items)))
            }
            MockResponse::Error(error) => Err(error),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("mock", "mock-1")
    }
}

/// Splits content into word-sized chunks, keeping separators.
fn split_into_chunks(content: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for ch in content.chars() {
        current.push(ch);
        if ch.is_whitespace() {
            chunks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
