//! Streaming dialogue engine.
//!
//! Runs one conversational turn against the AI backend in streaming mode:
//! relays every increment to the caller as it arrives while accumulating
//! the full response, then persists the assistant message and any state
//! transition atomically once the stream is exhausted.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;

use crate::application::turn_locks::ConversationLocks;
use crate::domain::conversation::{CompletionSignal, StoredMessage};
use crate::ports::{AIProvider, ConversationRepository};

use super::{prepare_turn, settle_turn, TurnCommand, TurnError};

/// Capacity of the event channel between the engine and the caller.
///
/// Small on purpose: the engine should relay chunks at backend pace, and
/// a caller that stops reading eventually exerts backpressure instead of
/// buffering the whole response.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Events emitted to the caller during a streaming turn.
#[derive(Debug, Clone)]
pub enum TurnEvent {
    /// One increment of assistant output, in arrival order.
    Delta(String),
    /// Terminal event: the turn finished and was persisted.
    Done(TurnOutcome),
    /// Terminal event: the turn failed; nothing from this response was
    /// persisted.
    Error(String),
}

/// Result of a successfully settled turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The persisted assistant message.
    pub message: StoredMessage,
    /// Whether the conversation is completed after this turn.
    pub completed: bool,
}

/// Handler for streaming conversational turns.
pub struct StreamMessageHandler {
    provider: Arc<dyn AIProvider>,
    conversations: Arc<dyn ConversationRepository>,
    detector: Arc<dyn CompletionSignal>,
    locks: Arc<ConversationLocks>,
}

impl StreamMessageHandler {
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

    /// Runs one streaming turn.
    ///
    /// Returns a receiver of [`TurnEvent`]s once the turn is admitted:
    /// ownership verified and the user message durably persisted. Every
    /// stream ends with exactly one terminal event (`Done` or `Error`),
    /// so callers can distinguish completion from truncation.
    ///
    /// If the caller drops the receiver mid-stream, the engine stops
    /// relaying and discards the partial response without persisting it.
    ///
    /// # Errors
    ///
    /// - [`TurnError::NotFound`] when the conversation does not exist or
    ///   belongs to another user.
    /// - [`TurnError::Repository`] when the user message cannot be
    ///   persisted.
    pub async fn handle(&self, cmd: TurnCommand) -> Result<mpsc::Receiver<TurnEvent>, TurnError> {
        // Held for the whole turn, including the commit in the spawned
        // task: concurrent turns on one conversation must not interleave
        // their history reads and appends.
        let turn_guard = self.locks.acquire(cmd.conversation_id).await;

        let prepared = prepare_turn(self.conversations.as_ref(), &cmd).await?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let provider = Arc::clone(&self.provider);
        let conversations = Arc::clone(&self.conversations);
        let detector = Arc::clone(&self.detector);

        tokio::spawn(async move {
            let _turn_guard = turn_guard;
            run_stream(provider, conversations, detector, cmd, prepared, tx).await;
        });

        Ok(rx)
    }
}

/// Drives the backend stream to completion and settles the turn.
async fn run_stream(
    provider: Arc<dyn AIProvider>,
    conversations: Arc<dyn ConversationRepository>,
    detector: Arc<dyn CompletionSignal>,
    cmd: TurnCommand,
    prepared: super::PreparedTurn,
    tx: mpsc::Sender<TurnEvent>,
) {
    let mut stream = match provider.stream_complete(prepared.request).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!(conversation_id = %cmd.conversation_id, error = %e, "backend refused stream");
            let _ = tx.send(TurnEvent::Error(e.to_string())).await;
            return;
        }
    };

    let mut full_response = String::new();

    while let Some(item) = stream.next().await {
        match item {
            Ok(chunk) => {
                let is_final = chunk.is_final();
                if !chunk.delta.is_empty() {
                    full_response.push_str(&chunk.delta);
                    if tx.send(TurnEvent::Delta(chunk.delta)).await.is_err() {
                        // Caller disconnected; the accumulated partial
                        // response is discarded, matching the mid-stream
                        // failure policy.
                        tracing::debug!(conversation_id = %cmd.conversation_id, "caller gone, dropping turn");
                        return;
                    }
                }
                if is_final {
                    break;
                }
            }
            Err(e) => {
                // A partial assistant message is never committed; the
                // already-committed user message stays.
                tracing::warn!(conversation_id = %cmd.conversation_id, error = %e, "stream failed mid-flight");
                let _ = tx.send(TurnEvent::Error(e.to_string())).await;
                return;
            }
        }
    }

    let settled = settle_turn(
        conversations.as_ref(),
        detector.as_ref(),
        prepared.conversation,
        &cmd,
        prepared.first_exchange,
        full_response,
    )
    .await;

    match settled {
        Ok(outcome) => {
            let _ = tx.send(TurnEvent::Done(outcome)).await;
        }
        Err(e) => {
            tracing::error!(conversation_id = %cmd.conversation_id, error = %e, "failed to persist turn");
            let _ = tx.send(TurnEvent::Error(e.to_string())).await;
        }
    }
}
