use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Message, NewMessage},
    traits::MessageApiError,
};

const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, product_id, order_id, content, is_read, created_at";

pub async fn insert_message(message: NewMessage, conn: &mut SqliteConnection) -> Result<Message, MessageApiError> {
    let sql = format!(
        "INSERT INTO messages (sender_id, receiver_id, product_id, order_id, content) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {MESSAGE_COLUMNS}"
    );
    let message = sqlx::query_as::<_, Message>(&sql)
        .bind(message.sender_id)
        .bind(message.receiver_id)
        .bind(message.product_id)
        .bind(message.order_id)
        .bind(message.content)
        .fetch_one(conn)
        .await?;
    trace!("🗃️ Message #{} stored for user #{}", message.id, message.receiver_id);
    Ok(message)
}

pub async fn message_by_id(message_id: i64, conn: &mut SqliteConnection) -> Result<Option<Message>, MessageApiError> {
    let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1");
    let message = sqlx::query_as::<_, Message>(&sql).bind(message_id).fetch_optional(conn).await?;
    Ok(message)
}

/// All messages addressed to the given user, newest first.
pub async fn messages_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Message>, MessageApiError> {
    let sql = format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages WHERE receiver_id = $1 ORDER BY created_at DESC, id DESC"
    );
    let messages = sqlx::query_as::<_, Message>(&sql).bind(user_id).fetch_all(conn).await?;
    Ok(messages)
}

/// The two-way exchange between `user_a` and `user_b`, oldest first.
pub async fn conversation(
    user_a: i64,
    user_b: i64,
    product_id: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Message>, MessageApiError> {
    let mut sql = format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages \
         WHERE ((sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1))"
    );
    if product_id.is_some() {
        sql.push_str(" AND product_id = $3");
    }
    sql.push_str(" ORDER BY created_at ASC, id ASC");
    let mut query = sqlx::query_as::<_, Message>(&sql).bind(user_a).bind(user_b);
    if let Some(pid) = product_id {
        query = query.bind(pid);
    }
    let messages = query.fetch_all(conn).await?;
    Ok(messages)
}

/// Flips every unread message from `from_user` to `to_user` to read. `None` matches guest- and system-originated
/// messages (NULL sender).
pub async fn mark_read(
    from_user: Option<i64>,
    to_user: i64,
    conn: &mut SqliteConnection,
) -> Result<u64, MessageApiError> {
    let affected = match from_user {
        Some(sender) => {
            sqlx::query("UPDATE messages SET is_read = 1 WHERE receiver_id = $1 AND sender_id = $2 AND is_read = 0")
                .bind(to_user)
                .bind(sender)
                .execute(conn)
                .await?
                .rows_affected()
        },
        None => {
            sqlx::query("UPDATE messages SET is_read = 1 WHERE receiver_id = $1 AND sender_id IS NULL AND is_read = 0")
                .bind(to_user)
                .execute(conn)
                .await?
                .rows_affected()
        },
    };
    trace!("🗃️ Marked {affected} message(s) to user #{to_user} as read");
    Ok(affected)
}

pub async fn mark_message_read(message_id: i64, conn: &mut SqliteConnection) -> Result<(), MessageApiError> {
    let result = sqlx::query("UPDATE messages SET is_read = 1 WHERE id = $1")
        .bind(message_id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(MessageApiError::MessageNotFound(message_id));
    }
    Ok(())
}
