use thiserror::Error;

use crate::db_types::{Message, NewMessage};

#[derive(Debug, Clone, Error)]
pub enum MessageApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Message {0} does not exist")]
    MessageNotFound(i64),
}

impl From<sqlx::Error> for MessageApiError {
    fn from(e: sqlx::Error) -> Self {
        MessageApiError::DatabaseError(e.to_string())
    }
}

/// The notification channel: an append-only message log between two parties, optionally tagged with a product
/// and/or an order. Messages are never deleted and their content is never edited; only the read flag changes.
#[allow(async_fn_in_trait)]
pub trait MessageManagement {
    async fn send_message(&self, message: NewMessage) -> Result<Message, MessageApiError>;

    async fn fetch_message(&self, message_id: i64) -> Result<Option<Message>, MessageApiError>;

    /// All messages addressed to the given user, newest first.
    async fn messages_for_user(&self, user_id: i64) -> Result<Vec<Message>, MessageApiError>;

    /// The two-way exchange between `user_a` and `user_b`, oldest first, optionally narrowed to one product.
    async fn conversation(
        &self,
        user_a: i64,
        user_b: i64,
        product_id: Option<i64>,
    ) -> Result<Vec<Message>, MessageApiError>;

    /// Flips every unread message from `from_user` to `to_user` to read. Returns the number of messages affected.
    /// A `from_user` of `None` matches guest- and system-originated messages.
    async fn mark_read(&self, from_user: Option<i64>, to_user: i64) -> Result<u64, MessageApiError>;

    /// Marks a single message as read. Used by the order-reply handshake.
    async fn mark_message_read(&self, message_id: i64) -> Result<(), MessageApiError>;
}
