//! Chat API shared by the portal and the console.

use std::convert::Infallible;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::{
        Sse,
        sse::{Event, KeepAlive},
    },
};
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use clientdesk_core::ClientId;

use crate::error::AppError;
use crate::middleware::RequireAnyUser;
use crate::models::ChatMessage;
use crate::services::ChatService;
use crate::state::AppState;

fn client_id(raw: &str) -> Result<ClientId, AppError> {
    ClientId::parse(raw).map_err(|_| AppError::NotFound("Conversation not found".to_string()))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Only messages after this instant (RFC 3339).
    pub since: Option<DateTime<Utc>>,
}

/// GET /api/chat/{client_id}/messages
pub async fn history(
    State(state): State<AppState>,
    RequireAnyUser(user): RequireAnyUser,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    let messages = ChatService::new(state.store())
        .history(user.participant(), client_id(&id)?, query.since)
        .await?;
    Ok(Json(messages))
}

#[derive(Debug, Deserialize)]
pub struct SendMessage {
    pub body: String,
}

/// POST /api/chat/{client_id}/messages
pub async fn send(
    State(state): State<AppState>,
    RequireAnyUser(user): RequireAnyUser,
    Path(id): Path<String>,
    Json(request): Json<SendMessage>,
) -> Result<Json<ChatMessage>, AppError> {
    let message = ChatService::new(state.store())
        .send(user.participant(), client_id(&id)?, &request.body)
        .await?;
    Ok(Json(message))
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub updated: u64,
}

/// POST /api/chat/{client_id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    RequireAnyUser(user): RequireAnyUser,
    Path(id): Path<String>,
) -> Result<Json<MarkedRead>, AppError> {
    let updated = ChatService::new(state.store())
        .mark_read(user.participant(), client_id(&id)?)
        .await?;
    Ok(Json(MarkedRead { updated }))
}

/// GET /api/chat/{client_id}/stream
///
/// Server-sent events, one `message` event per new chat message.
pub async fn stream(
    State(state): State<AppState>,
    RequireAnyUser(user): RequireAnyUser,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let client = ChatService::new(state.store())
        .open(user.participant(), client_id(&id)?)
        .await?;

    let events = state.chat_feed().conversation(client.id).map(|message| {
        let json = serde_json::to_string(&message)
            .unwrap_or_else(|_| r#"{"error":"Failed to serialize message"}"#.to_string());
        Ok(Event::default().event("message").data(json))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
