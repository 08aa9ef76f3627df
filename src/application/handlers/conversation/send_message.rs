//! Synchronous turn handler.
//!
//! Same contract as the streaming engine, but waits for the backend's
//! complete response and returns the persisted assistant message in one
//! piece. Used by callers that do not consume server-sent events.

use std::sync::Arc;

use crate::application::turn_locks::ConversationLocks;
use crate::domain::conversation::CompletionSignal;
use crate::ports::{AIProvider, ConversationRepository};

use super::{prepare_turn, settle_turn, TurnCommand, TurnError, TurnOutcome};

/// Handler for synchronous conversational turns.
pub struct SendMessageHandler {
    provider: Arc<dyn AIProvider>,
    conversations: Arc<dyn ConversationRepository>,
    detector: Arc<dyn CompletionSignal>,
    locks: Arc<ConversationLocks>,
}

impl SendMessageHandler {
    /// Creates a new handler with injected collaborators.
    pub fn new(
        provider: Arc<dyn AIProvider>,
        conversations: Arc<dyn ConversationRepository>,
        detector: Arc<dyn CompletionSignal>,
        locks: Arc<ConversationLocks>,
    ) -> Self {
        Self {
            provider,
            conversations,
            detector,
            locks,
        }
    }

    /// Runs one turn to completion and returns the persisted outcome.
    ///
    /// # Errors
    ///
    /// - [`TurnError::NotFound`] when the conversation does not exist or
    ///   belongs to another user.
    /// - [`TurnError::Backend`] when the AI backend fails; the user
    ///   message is already persisted and is not rolled back.
    /// - [`TurnError::Repository`] when persistence fails.
    pub async fn handle(&self, cmd: TurnCommand) -> Result<TurnOutcome, TurnError> {
        let _turn_guard = self.locks.acquire(cmd.conversation_id).await;

        let prepared = prepare_turn(self.conversations.as_ref(), &cmd).await?;

        let response = self
            .provider
            .complete(prepared.request)
            .await
            .map_err(|e| TurnError::Backend(e.to_string()))?;

        settle_turn(
            self.conversations.as_ref(),
            self.detector.as_ref(),
            prepared.conversation,
            &cmd,
            prepared.first_exchange,
            response.content,
        )
        .await
    }
}
