use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    api::order_objects::{OrderQueryFilter, Pagination},
    db_types::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatusType, PaymentStatusType},
    traits::OrderApiError,
};

const ORDER_COLUMNS: &str = "id, buyer_id, buyer_contact, total_amount, status, payment_status, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, order_id, product_id, seller_id, product_name, quantity, unit_price";

/// Inserts a new order record plus its line items using the given connection. This is not atomic on its own. Embed
/// the call in a transaction and pass `&mut *tx` as the connection argument to make it so.
pub async fn insert_order(
    order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<(Order, Vec<OrderItem>), OrderApiError> {
    let buyer_contact = order
        .buyer
        .contact()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| OrderApiError::DatabaseError(format!("Could not serialize buyer contact: {e}")))?;
    let sql = format!(
        "INSERT INTO orders (buyer_id, buyer_contact, total_amount) VALUES ($1, $2, $3) RETURNING {ORDER_COLUMNS}"
    );
    let stored = sqlx::query_as::<_, Order>(&sql)
        .bind(order.buyer.registered_id())
        .bind(buyer_contact)
        .bind(order.total_amount)
        .fetch_one(&mut *conn)
        .await?;
    let mut items = Vec::with_capacity(order.items.len());
    for item in order.items {
        let stored_item = insert_order_item(stored.id, item, &mut *conn).await?;
        items.push(stored_item);
    }
    debug!("🗃️ Order #{} saved with {} line item(s), total {}", stored.id, items.len(), stored.total_amount);
    Ok((stored, items))
}

async fn insert_order_item(
    order_id: i64,
    item: NewOrderItem,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, OrderApiError> {
    let sql = format!(
        "INSERT INTO order_items (order_id, product_id, seller_id, product_name, quantity, unit_price) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {ITEM_COLUMNS}"
    );
    let item = sqlx::query_as::<_, OrderItem>(&sql)
        .bind(order_id)
        .bind(item.product_id)
        .bind(item.seller_id)
        .bind(item.product_name)
        .bind(item.quantity)
        .bind(item.unit_price)
        .fetch_one(conn)
        .await?;
    Ok(item)
}

pub async fn order_by_id(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, OrderApiError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let order = sqlx::query_as::<_, Order>(&sql).bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn items_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, OrderApiError> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id ASC");
    let items = sqlx::query_as::<_, OrderItem>(&sql).bind(order_id).fetch_all(conn).await?;
    Ok(items)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`, newest first.
pub async fn search_orders(
    query: OrderQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, OrderApiError> {
    let mut builder = QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders "));
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(buyer_id) = query.buyer_id {
        where_clause.push("buyer_id = ");
        where_clause.push_bind_unseparated(buyer_id);
    }
    if let Some(seller_id) = query.seller_id {
        where_clause.push("id IN (SELECT order_id FROM order_items WHERE seller_id = ");
        where_clause.push_bind_unseparated(seller_id);
        where_clause.push_unseparated(")");
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    if let Some(statuses) = &query.status {
        if !statuses.is_empty() {
            let status_clause = statuses.iter().map(|s| format!("'{s}'")).collect::<Vec<_>>().join(",");
            where_clause.push(format!("status IN ({status_clause})"));
        }
    }
    builder.push(" ORDER BY created_at DESC, id DESC");

    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {} order(s)", orders.len());
    Ok(orders)
}

/// Orders placed by the given registered buyer, newest first.
pub async fn orders_for_buyer(
    buyer_id: i64,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, OrderApiError> {
    let sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE buyer_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
    );
    let orders = sqlx::query_as::<_, Order>(&sql)
        .bind(buyer_id)
        .bind(pagination.limit)
        .bind(pagination.offset)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Orders containing at least one line item owned by the given seller, newest first.
pub async fn orders_for_seller(seller_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, OrderApiError> {
    let sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders \
         WHERE id IN (SELECT order_id FROM order_items WHERE seller_id = $1) \
         ORDER BY created_at DESC, id DESC"
    );
    let orders = sqlx::query_as::<_, Order>(&sql).bind(seller_id).fetch_all(conn).await?;
    Ok(orders)
}

pub async fn update_order_status(
    order_id: i64,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderApiError> {
    let sql = format!(
        "UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING {ORDER_COLUMNS}"
    );
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(status.to_string())
        .bind(order_id)
        .fetch_optional(conn)
        .await?
        .ok_or(OrderApiError::OrderNotFound(order_id))?;
    Ok(order)
}

pub async fn update_payment_status(
    order_id: i64,
    status: PaymentStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderApiError> {
    let sql = format!(
        "UPDATE orders SET payment_status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 \
         RETURNING {ORDER_COLUMNS}"
    );
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(status.to_string())
        .bind(order_id)
        .fetch_optional(conn)
        .await?
        .ok_or(OrderApiError::OrderNotFound(order_id))?;
    Ok(order)
}
