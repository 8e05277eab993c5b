//! Client/seller chat: access rules, message operations and the realtime
//! feed.
//!
//! New messages reach subscribers through Postgres `LISTEN/NOTIFY`: every
//! insert notifies [`CHAT_CHANNEL`] with the message id, a single
//! [`ChatFeed`] listener task loads the message and fans it out over a
//! broadcast channel, and each SSE stream keeps only its own conversation.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::Stream;
use sqlx::PgPool;
use sqlx::postgres::PgListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use clientdesk_core::{ChatMessageId, ChatSender, ClientId, PortalRole};

use crate::db::{CHAT_CHANNEL, ChatStore, ClientStore, Store};
use crate::error::AppError;
use crate::models::chat::normalize_body;
use crate::models::{ChatMessage, Client, ConsoleUser, NewChatMessage, PortalUser};

/// Messages returned by one history request.
pub const HISTORY_LIMIT: i64 = 200;

/// Buffered messages per subscriber before it starts lagging.
const FEED_CAPACITY: usize = 256;

/// Who is taking part in a conversation.
#[derive(Debug, Clone, Copy)]
pub enum Participant<'a> {
    Portal(&'a PortalUser),
    Console(&'a ConsoleUser),
}

impl Participant<'_> {
    /// The side this participant writes as.
    #[must_use]
    pub const fn side(&self) -> ChatSender {
        match self {
            Self::Portal(_) => ChatSender::Client,
            Self::Console(_) => ChatSender::Seller,
        }
    }

    /// Whether this participant may read and write `client`'s conversation.
    ///
    /// Portal clients see only their own conversation and leads have none;
    /// sellers see their assigned clients; admins see every conversation.
    #[must_use]
    pub fn can_access(&self, client: &Client) -> bool {
        match self {
            Self::Portal(user) => {
                user.role == PortalRole::Client && user.client_id == Some(client.id)
            }
            Self::Console(user) => {
                user.is_admin() || (client.seller_id.is_some() && client.seller_id == user.seller_id())
            }
        }
    }
}

/// Message operations with access checks.
pub struct ChatService<'a> {
    store: &'a dyn Store,
}

impl<'a> ChatService<'a> {
    /// Create a new chat service.
    #[must_use]
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Load a client and check the participant may use its conversation.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown client, `Forbidden` without access.
    pub async fn open(
        &self,
        participant: Participant<'_>,
        client_id: ClientId,
    ) -> Result<Client, AppError> {
        let client = self
            .store
            .get_client(client_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Conversation not found".to_string()))?;

        if !participant.can_access(&client) {
            return Err(AppError::Forbidden(
                "You do not have access to this conversation".to_string(),
            ));
        }
        Ok(client)
    }

    /// Conversation history, oldest first. With `since`, only newer messages.
    ///
    /// # Errors
    ///
    /// See [`ChatService::open`]; database failures.
    pub async fn history(
        &self,
        participant: Participant<'_>,
        client_id: ClientId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<ChatMessage>, AppError> {
        self.open(participant, client_id).await?;
        Ok(self
            .store
            .list_messages(client_id, since, HISTORY_LIMIT)
            .await?)
    }

    /// Store a message from the participant's side.
    ///
    /// # Errors
    ///
    /// `BadRequest` for an empty or oversized body; see
    /// [`ChatService::open`].
    #[instrument(skip(self, participant, body), fields(client_id = %client_id))]
    pub async fn send(
        &self,
        participant: Participant<'_>,
        client_id: ClientId,
        body: &str,
    ) -> Result<ChatMessage, AppError> {
        let body = normalize_body(body).map_err(|e| AppError::BadRequest(e.to_string()))?;
        let client = self.open(participant, client_id).await?;

        let seller_id = match participant {
            Participant::Console(user) => user.seller_id().or(client.seller_id),
            Participant::Portal(_) => client.seller_id,
        };

        let message = self
            .store
            .insert_message(NewChatMessage {
                client_id,
                seller_id,
                sender: participant.side(),
                body,
            })
            .await?;

        debug!(message_id = %message.id, sender = %message.sender, "Chat message stored");
        Ok(message)
    }

    /// Mark the other side's messages as read.
    ///
    /// # Errors
    ///
    /// See [`ChatService::open`]; database failures.
    pub async fn mark_read(
        &self,
        participant: Participant<'_>,
        client_id: ClientId,
    ) -> Result<u64, AppError> {
        self.open(participant, client_id).await?;
        Ok(self.store.mark_read(client_id, participant.side()).await?)
    }

    /// Messages waiting for the participant.
    ///
    /// # Errors
    ///
    /// See [`ChatService::open`]; database failures.
    pub async fn unread(
        &self,
        participant: Participant<'_>,
        client_id: ClientId,
    ) -> Result<i64, AppError> {
        self.open(participant, client_id).await?;
        Ok(self
            .store
            .unread_count(client_id, participant.side())
            .await?)
    }
}

/// Fan-out of newly stored chat messages.
#[derive(Clone)]
pub struct ChatFeed {
    sender: broadcast::Sender<ChatMessage>,
}

impl Default for ChatFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatFeed {
    /// Create a feed with no listener attached.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);
        Self { sender }
    }

    /// Receive every message published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChatMessage> {
        self.sender.subscribe()
    }

    /// Deliver a message to current subscribers.
    pub fn publish(&self, message: ChatMessage) {
        // No subscribers is not an error.
        let _ = self.sender.send(message);
    }

    /// Messages of one conversation, as they arrive. Lagged receivers skip
    /// what they missed; the stream ends when the feed is dropped.
    pub fn conversation(&self, client_id: ClientId) -> impl Stream<Item = ChatMessage> + use<> {
        let mut receiver = self.subscribe();
        async_stream::stream! {
            loop {
                match receiver.recv().await {
                    Ok(message) if message.client_id == client_id => {
                        yield message;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, client_id = %client_id, "Chat subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    /// Start the `LISTEN` task that feeds this channel.
    ///
    /// The listener reconnects on its own after connection loss; if it
    /// cannot be created at all, the task logs and retries after a pause.
    #[must_use]
    pub fn spawn_listener(&self, pool: PgPool, store: Arc<dyn Store>) -> JoinHandle<()> {
        let feed = self.clone();
        tokio::spawn(async move {
            loop {
                match listen(&pool, store.as_ref(), &feed).await {
                    Ok(()) => break,
                    Err(e) => {
                        error!(error = %e, "Chat listener failed");
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        })
    }
}

async fn listen(pool: &PgPool, store: &dyn Store, feed: &ChatFeed) -> Result<(), sqlx::Error> {
    let mut listener = PgListener::connect_with(pool).await?;
    listener.listen(CHAT_CHANNEL).await?;
    info!(channel = CHAT_CHANNEL, "Chat listener started");

    loop {
        let notification = listener.recv().await?;
        let Ok(id) = ChatMessageId::parse(notification.payload()) else {
            warn!(payload = notification.payload(), "Ignoring malformed chat notification");
            continue;
        };
        match store.get_message(id).await {
            Ok(Some(message)) => feed.publish(message),
            Ok(None) => debug!(message_id = %id, "Notified message no longer exists"),
            Err(e) => warn!(error = %e, message_id = %id, "Failed to load notified message"),
        }
    }
}
