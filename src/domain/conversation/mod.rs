//! Conversation domain - the dialogue aggregate and its pure helpers.

mod completion;
mod conversation;
mod extractor;
mod message;

pub use completion::{CompletionSignal, MarkerPhraseDetector};
pub use conversation::{Conversation, MAX_TITLE_LENGTH};
pub use extractor::{ExtractionError, SchemaExtractor};
pub use message::{MessageRole, StoredMessage};
