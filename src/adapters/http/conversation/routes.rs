//! Axum routes for conversation endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{
    create_conversation, get_conversation, list_conversations, send_message, stream_message,
    update_conversation, ConversationAppState,
};

/// Creates routes for conversation endpoints.
///
/// - POST / - Create a conversation
/// - GET / - List the caller's conversations
/// - GET /:conversation_id - Conversation detail with messages
/// - PATCH /:conversation_id - Update title / complete
/// - POST /:conversation_id/messages - Synchronous turn
/// - POST /:conversation_id/messages/stream - Streaming turn (SSE)
pub fn routes(state: ConversationAppState) -> Router {
    Router::new()
        .route("/", post(create_conversation).get(list_conversations))
        .route(
            "/:conversation_id",
            get(get_conversation).patch(update_conversation),
        )
        .route("/:conversation_id/messages", post(send_message))
        .route("/:conversation_id/messages/stream", post(stream_message))
        .with_state(state)
}
