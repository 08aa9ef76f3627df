//! HTTP handlers for conversation endpoints.
//!
//! The streaming turn endpoint speaks Server-Sent Events with a fixed
//! framing: one `data:` event per assistant increment, then a terminal
//! `data: [DONE]` on success or `data: ERROR: <message>` on failure.
//! That framing is part of the wire contract and must not change.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use futures::stream::Stream;

use crate::application::handlers::conversation::{
    SendMessageHandler, StreamMessageHandler, TurnCommand, TurnError, TurnEvent,
};
use crate::adapters::http::middleware::RequireAuth;
use crate::domain::conversation::Conversation;
use crate::domain::foundation::ConversationId;
use crate::ports::ConversationRepository;

use super::dto::{
    ConversationDetailView, ConversationSummaryView, CreateConversationRequest, MessageView,
    PaginationParams, SendMessageRequest, UpdateConversationRequest,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state for conversation handlers.
#[derive(Clone)]
pub struct ConversationAppState {
    pub conversations: Arc<dyn ConversationRepository>,
    pub send_handler: Arc<SendMessageHandler>,
    pub stream_handler: Arc<StreamMessageHandler>,
}

impl ConversationAppState {
    /// Creates a new ConversationAppState.
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        send_handler: Arc<SendMessageHandler>,
        stream_handler: Arc<StreamMessageHandler>,
    ) -> Self {
        Self {
            conversations,
            send_handler,
            stream_handler,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Conversation CRUD
// ════════════════════════════════════════════════════════════════════════════════

/// POST / - Create a new conversation.
///
/// # Errors
/// - 401 Unauthorized: no valid auth token
pub async fn create_conversation(
    State(state): State<ConversationAppState>,
    RequireAuth(caller): RequireAuth,
    Json(request): Json<CreateConversationRequest>,
) -> Result<impl IntoResponse, ConversationApiError> {
    let conversation = Conversation::new(caller.id, request.title);
    state
        .conversations
        .create(&conversation)
        .await
        .map_err(|e| ConversationApiError::Internal(e.to_string()))?;

    let view = ConversationDetailView::new(&conversation, &[]);
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET / - List the caller's conversations, newest first.
pub async fn list_conversations(
    State(state): State<ConversationAppState>,
    RequireAuth(caller): RequireAuth,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ConversationApiError> {
    let summaries = state
        .conversations
        .list_for_user(caller.id, params.effective_skip(), params.effective_limit())
        .await
        .map_err(|e| ConversationApiError::Internal(e.to_string()))?;

    let views: Vec<ConversationSummaryView> =
        summaries.iter().map(ConversationSummaryView::from).collect();
    Ok((StatusCode::OK, Json(views)))
}

/// GET /:id - Conversation detail with full ordered message history.
///
/// # Errors
/// - 404 Not Found: unknown conversation, or owned by someone else
pub async fn get_conversation(
    State(state): State<ConversationAppState>,
    RequireAuth(caller): RequireAuth,
    Path(conversation_id): Path<String>,
) -> Result<impl IntoResponse, ConversationApiError> {
    let conversation_id = parse_conversation_id(&conversation_id)?;

    let conversation = state
        .conversations
        .find_for_user(conversation_id, caller.id)
        .await
        .map_err(|e| ConversationApiError::Internal(e.to_string()))?
        .ok_or(ConversationApiError::NotFound)?;

    let messages = state
        .conversations
        .list_messages(conversation_id)
        .await
        .map_err(|e| ConversationApiError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        Json(ConversationDetailView::new(&conversation, &messages)),
    ))
}

/// PATCH /:id - Update title or complete the conversation.
///
/// # Errors
/// - 400 Bad Request: attempt to reopen a completed conversation
/// - 404 Not Found: unknown conversation, or owned by someone else
pub async fn update_conversation(
    State(state): State<ConversationAppState>,
    RequireAuth(caller): RequireAuth,
    Path(conversation_id): Path<String>,
    Json(request): Json<UpdateConversationRequest>,
) -> Result<impl IntoResponse, ConversationApiError> {
    let conversation_id = parse_conversation_id(&conversation_id)?;

    let mut conversation = state
        .conversations
        .find_for_user(conversation_id, caller.id)
        .await
        .map_err(|e| ConversationApiError::Internal(e.to_string()))?
        .ok_or(ConversationApiError::NotFound)?;

    if let Some(title) = request.title {
        conversation.set_title(title);
    }
    match request.is_completed {
        Some(true) => {
            conversation.complete();
        }
        Some(false) if conversation.is_completed() => {
            return Err(ConversationApiError::BadRequest(
                "A completed conversation cannot be reopened".to_string(),
            ));
        }
        _ => {}
    }

    state
        .conversations
        .update(&conversation)
        .await
        .map_err(|e| ConversationApiError::Internal(e.to_string()))?;

    let messages = state
        .conversations
        .list_messages(conversation_id)
        .await
        .map_err(|e| ConversationApiError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        Json(ConversationDetailView::new(&conversation, &messages)),
    ))
}

// ════════════════════════════════════════════════════════════════════════════════
// Turn endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /:id/messages - Run one turn and return the full assistant reply.
///
/// # Errors
/// - 400 Bad Request: empty or oversized message
/// - 404 Not Found: unknown conversation, or owned by someone else
/// - 502 Bad Gateway: AI backend failure (the user message stays persisted)
pub async fn send_message(
    State(state): State<ConversationAppState>,
    RequireAuth(caller): RequireAuth,
    Path(conversation_id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ConversationApiError> {
    let conversation_id = parse_conversation_id(&conversation_id)?;
    request
        .validate()
        .map_err(|msg| ConversationApiError::BadRequest(msg.to_string()))?;

    let outcome = state
        .send_handler
        .handle(TurnCommand::new(conversation_id, caller.id, request.content))
        .await
        .map_err(ConversationApiError::from)?;

    Ok((StatusCode::OK, Json(MessageView::from(&outcome.message))))
}

/// POST /:id/messages/stream - Run one turn, streaming the reply as SSE.
///
/// Wire contract: each assistant increment arrives as a `data:` event; the
/// stream always terminates with `data: [DONE]` on success or
/// `data: ERROR: <message>` on failure.
///
/// # Errors
/// - 400 Bad Request: empty or oversized message
/// - 404 Not Found: unknown conversation, or owned by someone else
pub async fn stream_message(
    State(state): State<ConversationAppState>,
    RequireAuth(caller): RequireAuth,
    Path(conversation_id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ConversationApiError> {
    let conversation_id = parse_conversation_id(&conversation_id)?;
    request
        .validate()
        .map_err(|msg| ConversationApiError::BadRequest(msg.to_string()))?;

    let receiver = state
        .stream_handler
        .handle(TurnCommand::new(conversation_id, caller.id, request.content))
        .await
        .map_err(ConversationApiError::from)?;

    // No keep-alive comments: the event framing below is the whole wire
    // contract, terminal marker included.
    let stream = futures::stream::unfold(receiver, |mut receiver| async move {
        receiver
            .recv()
            .await
            .map(|event| (Ok(to_sse_event(event)), receiver))
    });

    Ok(Sse::new(stream))
}

/// Maps an engine event onto the SSE wire framing.
///
/// Carriage returns cannot appear inside an SSE field; newlines are split
/// into consecutive `data:` lines by the event builder.
fn to_sse_event(event: TurnEvent) -> Event {
    match event {
        TurnEvent::Delta(chunk) => Event::default().data(chunk.replace('\r', "")),
        TurnEvent::Done(_) => Event::default().data("[DONE]"),
        TurnEvent::Error(message) => Event::default().data(format!("ERROR: {}", message.replace('\r', ""))),
    }
}

fn parse_conversation_id(raw: &str) -> Result<ConversationId, ConversationApiError> {
    raw.parse()
        .map_err(|_| ConversationApiError::BadRequest("Invalid conversation ID format".to_string()))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts turn errors to HTTP responses.
#[derive(Debug)]
pub enum ConversationApiError {
    BadRequest(String),
    NotFound,
    BadGateway(String),
    Internal(String),
}

impl From<TurnError> for ConversationApiError {
    fn from(error: TurnError) -> Self {
        match error {
            TurnError::NotFound => ConversationApiError::NotFound,
            TurnError::Backend(message) => ConversationApiError::BadGateway(message),
            TurnError::Repository(message) => ConversationApiError::Internal(message),
        }
    }
}

impl IntoResponse for ConversationApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match self {
            ConversationApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
            }
            ConversationApiError::NotFound => (
                StatusCode::NOT_FOUND,
                "CONVERSATION_NOT_FOUND",
                "Conversation not found".to_string(),
            ),
            ConversationApiError::BadGateway(message) => {
                tracing::warn!("AI backend error: {}", message);
                (
                    StatusCode::BAD_GATEWAY,
                    "AI_BACKEND_ERROR",
                    "Error generating AI response".to_string(),
                )
            }
            ConversationApiError::Internal(message) => {
                tracing::error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        (
            status,
            Json(serde_json::json!({ "code": code, "message": message })),
        )
            .into_response()
    }
}
