//! Shared test doubles for turn handler tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;

use crate::domain::conversation::{Conversation, MessageRole, StoredMessage};
use crate::domain::foundation::{ConversationId, UserId};
use crate::ports::{
    AIError, AIProvider, ChunkStream, CompletionRequest, CompletionResponse, ConversationRepository,
    ConversationSummary, FinishReason, ProviderInfo, RepositoryError, StreamChunk, TokenUsage,
};

/// In-memory conversation store mirroring the repository contract.
#[derive(Default)]
pub(crate) struct InMemoryConversationRepository {
    conversations: Mutex<HashMap<ConversationId, Conversation>>,
    messages: Mutex<Vec<StoredMessage>>,
}

impl InMemoryConversationRepository {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_conversation(conversation: Conversation) -> Self {
        let repo = Self::new();
        repo.conversations
            .lock()
            .unwrap()
            .insert(conversation.id(), conversation);
        repo
    }

    /// Snapshot of a stored conversation.
    pub(crate) fn conversation(&self, id: ConversationId) -> Conversation {
        self.conversations
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .expect("conversation missing")
    }

    /// Messages of one conversation in insertion (creation) order.
    pub(crate) fn messages(&self, id: ConversationId) -> Vec<StoredMessage> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.conversation_id == id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn create(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        self.conversations
            .lock()
            .unwrap()
            .insert(conversation.id(), conversation.clone());
        Ok(())
    }

    async fn find_for_user(
        &self,
        id: ConversationId,
        user_id: UserId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self
            .conversations
            .lock()
            .unwrap()
            .get(&id)
            .filter(|c| c.is_owned_by(user_id))
            .cloned())
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<ConversationSummary>, RepositoryError> {
        let messages = self.messages.lock().unwrap();
        let mut summaries: Vec<ConversationSummary> = self
            .conversations
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.is_owned_by(user_id))
            .map(|c| ConversationSummary {
                id: c.id(),
                title: c.title().map(str::to_string),
                is_completed: c.is_completed(),
                created_at: c.created_at(),
                message_count: messages.iter().filter(|m| m.conversation_id == c.id()).count()
                    as u32,
            })
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn update(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        let mut conversations = self.conversations.lock().unwrap();
        if !conversations.contains_key(&conversation.id()) {
            return Err(RepositoryError::NotFound);
        }
        conversations.insert(conversation.id(), conversation.clone());
        Ok(())
    }

    async fn append_message(&self, message: &StoredMessage) -> Result<(), RepositoryError> {
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn list_messages(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<StoredMessage>, RepositoryError> {
        Ok(self.messages(conversation_id))
    }

    async fn latest_assistant_message(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<StoredMessage>, RepositoryError> {
        Ok(self
            .messages(conversation_id)
            .into_iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant))
    }

    async fn commit_turn(
        &self,
        message: &StoredMessage,
        conversation: &Conversation,
    ) -> Result<(), RepositoryError> {
        // Mirrors the transactional adapter: both writes or neither.
        let mut conversations = self.conversations.lock().unwrap();
        if !conversations.contains_key(&conversation.id()) {
            return Err(RepositoryError::NotFound);
        }
        self.messages.lock().unwrap().push(message.clone());
        conversations.insert(conversation.id(), conversation.clone());
        Ok(())
    }
}

type ScriptedChunks = Vec<Result<String, AIError>>;

/// AI provider double driven by a pre-scripted response.
pub(crate) struct ScriptedProvider {
    chunks: Mutex<Option<ScriptedChunks>>,
    completion: Mutex<Option<Result<String, AIError>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedProvider {
    /// Provider whose stream yields the given chunks in order.
    ///
    /// If every chunk is Ok, a final stop chunk is appended.
    pub(crate) fn streaming(chunks: ScriptedChunks) -> Self {
        Self {
            chunks: Mutex::new(Some(chunks)),
            completion: Mutex::new(None),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Provider whose non-streaming completion returns the given result.
    pub(crate) fn completing(result: Result<String, AIError>) -> Self {
        Self {
            chunks: Mutex::new(None),
            completion: Mutex::new(Some(result)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle onto every request this provider has received.
    pub(crate) fn requests(&self) -> Arc<Mutex<Vec<CompletionRequest>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl AIProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        self.requests.lock().unwrap().push(request);
        let scripted = self
            .completion
            .lock()
            .unwrap()
            .take()
            .expect("no scripted completion");
        scripted.map(|content| CompletionResponse {
            content,
            usage: TokenUsage::new(10, 20),
            model: "scripted".to_string(),
            finish_reason: FinishReason::Stop,
        })
    }

    async fn stream_complete(&self, request: CompletionRequest) -> Result<ChunkStream, AIError> {
        self.requests.lock().unwrap().push(request);
        let chunks = self
            .chunks
            .lock()
            .unwrap()
            .take()
            .expect("no scripted stream");

        let clean = chunks.iter().all(Result::is_ok);
        let mut items: Vec<Result<StreamChunk, AIError>> = chunks
            .into_iter()
            .map(|r| r.map(StreamChunk::content))
            .collect();
        if clean {
            items.push(Ok(StreamChunk::final_chunk(
                FinishReason::Stop,
                Some(TokenUsage::new(10, 20)),
            )));
        }

        Ok(Box::pin(stream::iter(items)))
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("scripted", "scripted-1")
    }
}
