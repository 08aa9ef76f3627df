//! Integration tests for the streaming dialogue engine.
//!
//! These tests drive the engine end-to-end over the mock AI provider and
//! in-memory repositories:
//! 1. Turn events arrive in order and always end with a terminal event
//! 2. Persistence is atomic: failed streams leave no assistant message
//! 3. Completion detection flips conversation state exactly once
//! 4. Concurrent turns on one conversation are serialized

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use taskforge::adapters::ai::MockAIProvider;
use taskforge::application::handlers::conversation::{
    StreamMessageHandler, TurnCommand, TurnEvent,
};
use taskforge::application::handlers::task_definition::{
    CreateTaskDefinitionCommand, CreateTaskDefinitionError, CreateTaskDefinitionHandler,
};
use taskforge::application::ConversationLocks;
use taskforge::domain::conversation::{
    Conversation, MarkerPhraseDetector, MessageRole, StoredMessage,
};
use taskforge::domain::foundation::{ConversationId, TaskDefinitionId, UserId};
use taskforge::domain::task_definition::TaskDefinition;
use taskforge::ports::{
    AIError, ConversationRepository, ConversationSummary, RepositoryError, TaskDefinitionRepository,
};

// =============================================================================
// Test Infrastructure
// =============================================================================

/// In-memory conversation store with an append-only message log.
#[derive(Default)]
struct InMemoryStore {
    conversations: Mutex<HashMap<ConversationId, Conversation>>,
    messages: Mutex<Vec<StoredMessage>>,
    definitions: Mutex<Vec<TaskDefinition>>,
}

impl InMemoryStore {
    fn with_conversation(conversation: Conversation) -> Arc<Self> {
        let store = Arc::new(Self::default());
        store
            .conversations
            .lock()
            .unwrap()
            .insert(conversation.id(), conversation);
        store
    }

    fn conversation(&self, id: ConversationId) -> Conversation {
        self.conversations.lock().unwrap()[&id].clone()
    }

    fn messages_of(&self, id: ConversationId) -> Vec<StoredMessage> {
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
impl ConversationRepository for InMemoryStore {
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
        _user_id: UserId,
        _skip: u32,
        _limit: u32,
    ) -> Result<Vec<ConversationSummary>, RepositoryError> {
        unimplemented!("not used by these tests")
    }

    async fn update(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        self.conversations
            .lock()
            .unwrap()
            .insert(conversation.id(), conversation.clone());
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
        Ok(self.messages_of(conversation_id))
    }

    async fn latest_assistant_message(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<StoredMessage>, RepositoryError> {
        Ok(self
            .messages_of(conversation_id)
            .into_iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant))
    }

    async fn commit_turn(
        &self,
        message: &StoredMessage,
        conversation: &Conversation,
    ) -> Result<(), RepositoryError> {
        self.messages.lock().unwrap().push(message.clone());
        self.conversations
            .lock()
            .unwrap()
            .insert(conversation.id(), conversation.clone());
        Ok(())
    }
}

#[async_trait]
impl TaskDefinitionRepository for InMemoryStore {
    async fn create(
        &self,
        definition: &TaskDefinition,
        conversation: &Conversation,
    ) -> Result<(), RepositoryError> {
        let mut definitions = self.definitions.lock().unwrap();
        if definitions
            .iter()
            .any(|d| d.conversation_id == definition.conversation_id)
        {
            return Err(RepositoryError::Conflict);
        }
        definitions.push(definition.clone());
        self.conversations
            .lock()
            .unwrap()
            .insert(conversation.id(), conversation.clone());
        Ok(())
    }

    async fn find_for_user(
        &self,
        id: TaskDefinitionId,
        user_id: UserId,
    ) -> Result<Option<TaskDefinition>, RepositoryError> {
        Ok(self
            .definitions
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id == id && d.user_id == user_id)
            .cloned())
    }

    async fn find_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<TaskDefinition>, RepositoryError> {
        Ok(self
            .definitions
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.conversation_id == conversation_id)
            .cloned())
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        _skip: u32,
        _limit: u32,
    ) -> Result<Vec<TaskDefinition>, RepositoryError> {
        Ok(self
            .definitions
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: TaskDefinitionId, user_id: UserId) -> Result<(), RepositoryError> {
        let mut definitions = self.definitions.lock().unwrap();
        let before = definitions.len();
        definitions.retain(|d| !(d.id == id && d.user_id == user_id));
        if definitions.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

fn engine(provider: MockAIProvider, store: Arc<InMemoryStore>) -> StreamMessageHandler {
    StreamMessageHandler::new(
        Arc::new(provider),
        store,
        Arc::new(MarkerPhraseDetector::default()),
        Arc::new(ConversationLocks::new()),
    )
}

async fn run_turn(
    handler: &StreamMessageHandler,
    conversation_id: ConversationId,
    user_id: UserId,
    content: &str,
) -> Vec<TurnEvent> {
    let mut receiver = handler
        .handle(TurnCommand::new(conversation_id, user_id, content))
        .await
        .expect("turn should be admitted");

    let mut events = Vec::new();
    while let Some(event) = receiver.recv().await {
        events.push(event);
    }
    events
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn fresh_conversation_turn_appends_streams_and_terminates() {
    let user_id = UserId::new();
    let conversation = Conversation::new(user_id, None);
    let conversation_id = conversation.id();
    let store = InMemoryStore::with_conversation(conversation);
    let provider = MockAIProvider::new().with_response("What labels do you need?");

    let handler = engine(provider, Arc::clone(&store));
    let events = run_turn(
        &handler,
        conversation_id,
        user_id,
        "Classify reviews as positive or negative",
    )
    .await;

    // Deltas in arrival order, then exactly one terminal event.
    assert!(events.len() >= 2);
    let (terminal, deltas) = events.split_last().unwrap();
    assert!(matches!(terminal, TurnEvent::Done(_)));
    let streamed: String = deltas
        .iter()
        .map(|event| match event {
            TurnEvent::Delta(chunk) => chunk.as_str(),
            other => panic!("unexpected event before terminal: {:?}", other),
        })
        .collect();
    assert_eq!(streamed, "What labels do you need?");

    let messages = store.messages_of(conversation_id);
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(
        messages[0].content,
        "Classify reviews as positive or negative"
    );
    assert_eq!(messages[1].role, MessageRole::Assistant);
    assert_eq!(messages[1].content, "What labels do you need?");

    // Creation-time order is non-decreasing.
    assert!(messages[0].created_at <= messages[1].created_at);
    assert!(!store.conversation(conversation_id).is_completed());
}

#[tokio::test]
async fn schema_bearing_reply_completes_conversation_and_allows_definition() {
    let user_id = UserId::new();
    let conversation = Conversation::new(user_id, None);
    let conversation_id = conversation.id();
    let store = InMemoryStore::with_conversation(conversation);
    let provider = MockAIProvider::new().with_response(
        "I now have enough information to create your data schema.\n\
         ```json\n{\"task_type\":\"classification\"}\n```",
    );

    let handler = engine(provider, Arc::clone(&store));
    let events = run_turn(&handler, conversation_id, user_id, "Classify reviews").await;

    let Some(TurnEvent::Done(outcome)) = events.last() else {
        panic!("expected Done, got {:?}", events.last());
    };
    assert!(outcome.completed);

    let stored = store.conversation(conversation_id);
    assert!(stored.is_completed());
    // Title derived from the first user message of the first exchange.
    assert_eq!(stored.title(), Some("Classify reviews"));

    // The extractable schema turns into a task definition.
    let creator = CreateTaskDefinitionHandler::new(
        Arc::clone(&store) as Arc<dyn ConversationRepository>,
        Arc::clone(&store) as Arc<dyn TaskDefinitionRepository>,
    );
    let definition = creator
        .handle(CreateTaskDefinitionCommand {
            conversation_id,
            user_id,
            name: "Review sentiment".to_string(),
            description: None,
            json_schema: None,
            recommended_models: None,
        })
        .await
        .unwrap();
    assert_eq!(definition.json_schema["task_type"], "classification");

    // A second definition for the same conversation conflicts; the first
    // one stays.
    let second = creator
        .handle(CreateTaskDefinitionCommand {
            conversation_id,
            user_id,
            name: "Duplicate".to_string(),
            description: None,
            json_schema: Some(serde_json::json!({})),
            recommended_models: None,
        })
        .await;
    assert!(matches!(
        second,
        Err(CreateTaskDefinitionError::AlreadyExists)
    ));
    let kept = TaskDefinitionRepository::find_by_conversation(store.as_ref(), conversation_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kept.id, definition.id);
}

#[tokio::test]
async fn backend_failure_after_two_chunks_discards_partial_response() {
    let user_id = UserId::new();
    let conversation = Conversation::new(user_id, None);
    let conversation_id = conversation.id();
    let store = InMemoryStore::with_conversation(conversation);
    let provider = MockAIProvider::new().with_failure_after(
        vec!["chunk one ".to_string(), "chunk two".to_string()],
        AIError::unavailable("backend exploded"),
    );

    let handler = engine(provider, Arc::clone(&store));
    let events = run_turn(&handler, conversation_id, user_id, "hello").await;

    assert_eq!(events.len(), 3);
    assert!(matches!(&events[0], TurnEvent::Delta(c) if c == "chunk one "));
    assert!(matches!(&events[1], TurnEvent::Delta(c) if c == "chunk two"));
    let TurnEvent::Error(message) = &events[2] else {
        panic!("expected terminal error, got {:?}", events[2]);
    };
    assert!(message.contains("backend exploded"));

    // The user message survived; the partial assistant text did not.
    let messages = store.messages_of(conversation_id);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, MessageRole::User);
    assert!(!store.conversation(conversation_id).is_completed());
}

#[tokio::test]
async fn concurrent_turns_on_one_conversation_are_serialized() {
    let user_id = UserId::new();
    let conversation = Conversation::new(user_id, None);
    let conversation_id = conversation.id();
    let store = InMemoryStore::with_conversation(conversation);
    let provider = MockAIProvider::new()
        .with_response("reply a")
        .with_response("reply b");

    let handler = Arc::new(engine(provider, Arc::clone(&store)));

    let first = {
        let handler = Arc::clone(&handler);
        tokio::spawn(async move { run_turn(&handler, conversation_id, user_id, "question a").await })
    };
    let second = {
        let handler = Arc::clone(&handler);
        tokio::spawn(async move { run_turn(&handler, conversation_id, user_id, "question b").await })
    };
    first.await.unwrap();
    second.await.unwrap();

    // Whichever turn won the lock, the log must alternate user/assistant:
    // a turn never reads history while another turn is mid-append.
    let messages = store.messages_of(conversation_id);
    assert_eq!(messages.len(), 4);
    let roles: Vec<MessageRole> = messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::User,
            MessageRole::Assistant,
        ]
    );

    // And the second turn's context contained the first full exchange.
    for pair in messages.windows(2) {
        assert!(pair[0].created_at <= pair[1].created_at);
    }
}

#[tokio::test]
async fn completion_state_never_reverts_on_later_turns() {
    let user_id = UserId::new();
    let conversation = Conversation::new(user_id, None);
    let conversation_id = conversation.id();
    let store = InMemoryStore::with_conversation(conversation);
    let provider = MockAIProvider::new()
        .with_response("```json\n{\"task_type\":\"qa\"}\n```")
        .with_response("Happy to adjust anything else.");

    let handler = engine(provider, Arc::clone(&store));
    run_turn(&handler, conversation_id, user_id, "Build a QA task").await;
    assert!(store.conversation(conversation_id).is_completed());

    // A later, non-schema reply must not reopen the conversation.
    run_turn(&handler, conversation_id, user_id, "thanks!").await;
    assert!(store.conversation(conversation_id).is_completed());
}
