//! HTTP endpoints for conversations and conversational turns.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    ConversationDetailView, ConversationSummaryView, CreateConversationRequest, MessageView,
    SendMessageRequest, UpdateConversationRequest,
};
pub use handlers::ConversationAppState;
pub use routes::routes;
