//! Database operations for chat messages.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use clientdesk_core::{ChatMessageId, ChatSender, ClientId, SellerId};

use super::{CHAT_CHANNEL, ChatStore, PgStore, RepositoryError};
use crate::models::{ChatMessage, NewChatMessage};

const MESSAGE_COLUMNS: &str = "id, client_id, seller_id, sender, body, read_at, created_at";

#[derive(Debug, sqlx::FromRow)]
struct ChatMessageRow {
    id: Uuid,
    client_id: Uuid,
    seller_id: Option<Uuid>,
    sender: ChatSender,
    body: String,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<ChatMessageRow> for ChatMessage {
    fn from(row: ChatMessageRow) -> Self {
        Self {
            id: ChatMessageId::new(row.id),
            client_id: ClientId::new(row.client_id),
            seller_id: row.seller_id.map(SellerId::new),
            sender: row.sender,
            body: row.body,
            read_at: row.read_at,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ChatStore for PgStore {
    async fn list_messages(
        &self,
        client: ClientId,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        // Newest `limit` messages, returned oldest first.
        let rows = sqlx::query_as::<_, ChatMessageRow>(&format!(
            r"
            SELECT {MESSAGE_COLUMNS} FROM (
                SELECT {MESSAGE_COLUMNS} FROM chat_messages
                WHERE client_id = $1
                  AND ($2::timestamptz IS NULL OR created_at > $2)
                ORDER BY created_at DESC
                LIMIT $3
            ) recent
            ORDER BY created_at ASC
            "
        ))
        .bind(client.as_uuid())
        .bind(since)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_message(
        &self,
        id: ChatMessageId,
    ) -> Result<Option<ChatMessage>, RepositoryError> {
        let row = sqlx::query_as::<_, ChatMessageRow>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM chat_messages WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn insert_message(
        &self,
        message: NewChatMessage,
    ) -> Result<ChatMessage, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let row = sqlx::query_as::<_, ChatMessageRow>(&format!(
            r"
            INSERT INTO chat_messages (client_id, seller_id, sender, body)
            VALUES ($1, $2, $3, $4)
            RETURNING {MESSAGE_COLUMNS}
            "
        ))
        .bind(message.client_id.as_uuid())
        .bind(message.seller_id.map(|s| s.as_uuid()))
        .bind(message.sender)
        .bind(&message.body)
        .fetch_one(&mut *tx)
        .await?;

        // Notifications are delivered on commit; the payload is only the id
        // since bodies can exceed the notification size limit.
        sqlx::query("SELECT pg_notify($1, $2)")
            .bind(CHAT_CHANNEL)
            .bind(row.id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    async fn mark_read(
        &self,
        client: ClientId,
        reader: ChatSender,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE chat_messages
            SET read_at = NOW()
            WHERE client_id = $1 AND sender = $2 AND read_at IS NULL
            ",
        )
        .bind(client.as_uuid())
        .bind(reader.other())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }

    async fn unread_count(
        &self,
        client: ClientId,
        reader: ChatSender,
    ) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM chat_messages
            WHERE client_id = $1 AND sender = $2 AND read_at IS NULL
            ",
        )
        .bind(client.as_uuid())
        .bind(reader.other())
        .fetch_one(self.pool())
        .await?;

        Ok(count)
    }
}
