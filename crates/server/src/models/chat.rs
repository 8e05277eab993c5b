//! Chat messages between a client and their seller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clientdesk_core::{ChatMessageId, ChatSender, ClientId, SellerId};

/// Longest accepted message body, in characters.
pub const MAX_BODY_CHARS: usize = 4000;

/// A message in a client's conversation.
///
/// Each client has exactly one conversation; `seller_id` records which
/// seller was assigned when the message was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: ChatMessageId,
    pub client_id: ClientId,
    pub seller_id: Option<SellerId>,
    pub sender: ChatSender,
    pub body: String,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A message about to be stored.
#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub client_id: ClientId,
    pub seller_id: Option<SellerId>,
    pub sender: ChatSender,
    pub body: String,
}

/// Why a message body was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BodyError {
    #[error("message cannot be empty")]
    Empty,
    #[error("message is limited to {MAX_BODY_CHARS} characters")]
    TooLong,
}

/// Trim a message body and check its length.
///
/// # Errors
///
/// Returns [`BodyError`] if the trimmed body is empty or too long.
pub fn normalize_body(raw: &str) -> Result<String, BodyError> {
    let body = raw.trim();
    if body.is_empty() {
        return Err(BodyError::Empty);
    }
    if body.chars().count() > MAX_BODY_CHARS {
        return Err(BodyError::TooLong);
    }
    Ok(body.to_string())
}
