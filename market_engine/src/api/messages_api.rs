use crate::{
    api::errors::MarketplaceApiError,
    db_types::{Message, NewMessage},
    traits::MessageManagement,
};

/// `MessagesApi` provides the notification channel: peer-to-peer messages between buyers and sellers, and the
/// retrieval/read-state operations. System-generated order notifications are sent by
/// [`crate::api::OrderFlowApi`] through the same channel.
#[derive(Debug, Clone)]
pub struct MessagesApi<B> {
    db: B,
}

impl<B> MessagesApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> MessagesApi<B>
where B: MessageManagement
{
    /// Append a message to the channel. `sender_id` of `None` marks a guest- or system-originated message.
    pub async fn send(&self, message: NewMessage) -> Result<Message, MarketplaceApiError> {
        let message = self.db.send_message(message).await.map_err(MarketplaceApiError::from)?;
        Ok(message)
    }

    pub async fn message(&self, message_id: i64) -> Result<Message, MarketplaceApiError> {
        self.db
            .fetch_message(message_id)
            .await
            .map_err(MarketplaceApiError::from)?
            .ok_or(MarketplaceApiError::MessageNotFound(message_id))
    }

    /// All messages addressed to the given user, newest first.
    pub async fn messages_for_user(&self, user_id: i64) -> Result<Vec<Message>, MarketplaceApiError> {
        let messages = self.db.messages_for_user(user_id).await.map_err(MarketplaceApiError::from)?;
        Ok(messages)
    }

    /// The two-way exchange between two users, oldest first, optionally narrowed to one product.
    pub async fn conversation(
        &self,
        user_a: i64,
        user_b: i64,
        product_id: Option<i64>,
    ) -> Result<Vec<Message>, MarketplaceApiError> {
        let messages = self.db.conversation(user_a, user_b, product_id).await.map_err(MarketplaceApiError::from)?;
        Ok(messages)
    }

    /// Acknowledge everything `to_user` has received from `from_user`. Returns the number of messages flipped.
    pub async fn mark_read(&self, from_user: Option<i64>, to_user: i64) -> Result<u64, MarketplaceApiError> {
        let affected = self.db.mark_read(from_user, to_user).await.map_err(MarketplaceApiError::from)?;
        Ok(affected)
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
