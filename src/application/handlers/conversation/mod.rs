//! Conversational turn handlers.
//!
//! A turn is one user message plus the resulting assistant reply. Both
//! the synchronous and streaming variants share the same contract: the
//! user message is durably persisted before the AI backend is contacted,
//! and the assistant message is committed together with any conversation
//! state transition as one unit - or not at all.

mod send_message;
mod stream_message;
#[cfg(test)]
pub(crate) mod test_support;

pub use send_message::SendMessageHandler;
pub use stream_message::{StreamMessageHandler, TurnEvent, TurnOutcome};

use thiserror::Error;

use crate::domain::conversation::{CompletionSignal, Conversation, StoredMessage};
use crate::domain::foundation::{ConversationId, UserId};
use crate::ports::{CompletionRequest, ConversationRepository};

/// Instruction given to the AI backend for every schema-synthesis
/// conversation.
pub const SYSTEM_PROMPT: &str = "\
You are a data structure expert helping users define machine-learning \
tasks. Guide the conversation in three steps: understand the user's task \
and goals, ask one or two focused clarifying questions at a time, and \
once you have enough detail, produce a complete JSON schema describing \
the task. Consider data types, required fields, validation rules, and \
example values.

When you are ready to produce the schema, say:
\"I now have enough information to create your data schema. Here's what \
I've designed based on our discussion:\"

Then provide the schema in a fenced code block tagged json.";

/// Command to run one conversational turn.
#[derive(Debug, Clone)]
pub struct TurnCommand {
    /// The conversation to extend.
    pub conversation_id: ConversationId,
    /// The caller, for ownership checks.
    pub user_id: UserId,
    /// The new user message.
    pub content: String,
}

impl TurnCommand {
    /// Creates a new turn command.
    pub fn new(conversation_id: ConversationId, user_id: UserId, content: impl Into<String>) -> Self {
        Self {
            conversation_id,
            user_id,
            content: content.into(),
        }
    }
}

/// Errors that can occur while running a turn.
#[derive(Debug, Clone, Error)]
pub enum TurnError {
    /// The conversation does not exist or is not owned by the caller.
    #[error("conversation not found")]
    NotFound,

    /// The AI backend failed before or during generation.
    #[error("ai backend error: {0}")]
    Backend(String),

    /// Persistence failed.
    #[error("repository error: {0}")]
    Repository(String),
}

/// Default temperature for turn completions.
const TURN_TEMPERATURE: f32 = 0.7;
/// Default token cap for assistant replies.
const TURN_MAX_TOKENS: u32 = 1000;

/// A validated turn, ready to be sent to the AI backend.
///
/// Produced while the conversation's turn lock is held; the user message
/// is already durably persisted at this point.
pub(crate) struct PreparedTurn {
    pub conversation: Conversation,
    pub request: CompletionRequest,
    /// True when the just-appended user message is the first message of
    /// the conversation.
    pub first_exchange: bool,
}

/// Validates ownership, persists the user message, and assembles the
/// prompt context: system instruction, then every prior message in
/// ascending creation-time order, then the new user message.
pub(crate) async fn prepare_turn(
    conversations: &dyn ConversationRepository,
    cmd: &TurnCommand,
) -> Result<PreparedTurn, TurnError> {
    let conversation = conversations
        .find_for_user(cmd.conversation_id, cmd.user_id)
        .await
        .map_err(|e| TurnError::Repository(e.to_string()))?
        .ok_or(TurnError::NotFound)?;

    // The user's input must survive any later failure, so it is committed
    // before the backend is contacted.
    let user_message = StoredMessage::user(cmd.conversation_id, &cmd.content);
    conversations
        .append_message(&user_message)
        .await
        .map_err(|e| TurnError::Repository(e.to_string()))?;

    let history = conversations
        .list_messages(cmd.conversation_id)
        .await
        .map_err(|e| TurnError::Repository(e.to_string()))?;
    let first_exchange = history.len() == 1;

    let request = CompletionRequest::new()
        .with_system_prompt(SYSTEM_PROMPT)
        .with_history(&history)
        .with_temperature(TURN_TEMPERATURE)
        .with_max_tokens(TURN_MAX_TOKENS);

    Ok(PreparedTurn {
        conversation,
        request,
        first_exchange,
    })
}

/// Finishes a turn after the full assistant response is known: runs the
/// completion classifier, applies the state transition on the aggregate,
/// and commits the assistant message together with that transition as one
/// unit.
pub(crate) async fn settle_turn(
    conversations: &dyn ConversationRepository,
    detector: &dyn CompletionSignal,
    mut conversation: Conversation,
    cmd: &TurnCommand,
    first_exchange: bool,
    full_response: String,
) -> Result<stream_message::TurnOutcome, TurnError> {
    let assistant_message = StoredMessage::assistant(cmd.conversation_id, full_response);

    if detector.is_complete(&assistant_message.content) {
        conversation.complete();
        if first_exchange {
            conversation.derive_title_from(&cmd.content);
        }
    }

    conversations
        .commit_turn(&assistant_message, &conversation)
        .await
        .map_err(|e| TurnError::Repository(e.to_string()))?;

    Ok(stream_message::TurnOutcome {
        message: assistant_message,
        completed: conversation.is_completed(),
    })
}
