//! The Conversation aggregate and its completion state machine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConversationId, Timestamp, UserId};

/// Maximum length of an auto-derived conversation title, in characters.
pub const MAX_TITLE_LENGTH: usize = 50;

/// A dialogue between one user and the assistant, working toward a task
/// definition schema.
///
/// Lifecycle: created open, mutated by message turns, and transitioned to
/// the terminal completed state exactly once - either when the assistant
/// produces a recognizable schema, or when a task definition is created
/// for it. The transition never reverts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    id: ConversationId,
    user_id: UserId,
    title: Option<String>,
    is_completed: bool,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Conversation {
    /// Creates a new open conversation owned by the given user.
    pub fn new(user_id: UserId, title: Option<String>) -> Self {
        let now = Timestamp::now();
        Self {
            id: ConversationId::new(),
            user_id,
            title,
            is_completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds a conversation from persisted state.
    pub fn reconstitute(
        id: ConversationId,
        user_id: UserId,
        title: Option<String>,
        is_completed: bool,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            user_id,
            title,
            is_completed,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> ConversationId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Checks whether the given user owns this conversation.
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Sets an explicit title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
        self.touch();
    }

    /// Marks the conversation completed.
    ///
    /// Returns true if this call performed the transition, false if the
    /// conversation was already completed. There is no way back to open.
    pub fn complete(&mut self) -> bool {
        if self.is_completed {
            return false;
        }
        self.is_completed = true;
        self.touch();
        true
    }

    /// Derives a title from the first user message if none is set.
    ///
    /// Long messages are truncated to [`MAX_TITLE_LENGTH`] characters with a
    /// trailing ellipsis marker.
    pub fn derive_title_from(&mut self, first_user_message: &str) {
        if self.title.is_some() {
            return;
        }
        self.title = Some(derive_title(first_user_message));
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}

/// Truncates a message into a display title.
fn derive_title(message: &str) -> String {
    let trimmed = message.trim();
    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        let truncated: String = trimmed.chars().take(MAX_TITLE_LENGTH).collect();
        format!("{}...", truncated)
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_conversation() -> Conversation {
        Conversation::new(UserId::new(), None)
    }

    #[test]
    fn new_conversation_starts_open() {
        let conversation = open_conversation();
        assert!(!conversation.is_completed());
        assert!(conversation.title().is_none());
    }

    #[test]
    fn complete_transitions_exactly_once() {
        let mut conversation = open_conversation();
        assert!(conversation.complete());
        assert!(conversation.is_completed());
        // Second call is a no-op, never a revert.
        assert!(!conversation.complete());
        assert!(conversation.is_completed());
    }

    #[test]
    fn ownership_check_matches_creator() {
        let user_id = UserId::new();
        let conversation = Conversation::new(user_id, None);
        assert!(conversation.is_owned_by(user_id));
        assert!(!conversation.is_owned_by(UserId::new()));
    }

    #[test]
    fn short_message_becomes_title_verbatim() {
        let mut conversation = open_conversation();
        conversation.derive_title_from("Classify reviews");
        assert_eq!(conversation.title(), Some("Classify reviews"));
    }

    #[test]
    fn long_message_is_truncated_with_ellipsis() {
        let mut conversation = open_conversation();
        let message = "x".repeat(80);
        conversation.derive_title_from(&message);
        let title = conversation.title().unwrap();
        assert_eq!(title.chars().count(), MAX_TITLE_LENGTH + 3);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let mut conversation = open_conversation();
        let message = "日本語のテキスト".repeat(10);
        conversation.derive_title_from(&message);
        assert!(conversation.title().unwrap().ends_with("..."));
    }

    #[test]
    fn derive_title_keeps_explicit_title() {
        let mut conversation = open_conversation();
        conversation.set_title("My project");
        conversation.derive_title_from("Something else entirely");
        assert_eq!(conversation.title(), Some("My project"));
    }

    #[test]
    fn exact_length_message_is_not_truncated() {
        let mut conversation = open_conversation();
        let message = "y".repeat(MAX_TITLE_LENGTH);
        conversation.derive_title_from(&message);
        assert_eq!(conversation.title(), Some(message.as_str()));
    }
}
