use thiserror::Error;

use crate::{
    api::order_objects::{OrderQueryFilter, Pagination},
    db_types::{Order, OrderItem, PaymentStatusType},
};

#[derive(Debug, Clone, Error)]
pub enum OrderApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("User error constructing query: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for OrderApiError {
    fn from(e: sqlx::Error) -> Self {
        OrderApiError::DatabaseError(e.to_string())
    }
}

/// Read access to the order ledger, plus the payment-status update reserved for the payment collaborator.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderApiError>;

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderApiError>;

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderApiError>;

    /// Orders placed by the given registered buyer, newest first.
    async fn orders_for_buyer(&self, buyer_id: i64, pagination: Pagination) -> Result<Vec<Order>, OrderApiError>;

    /// Orders containing at least one line item owned by the given seller, newest first.
    async fn orders_for_seller(&self, seller_id: i64) -> Result<Vec<Order>, OrderApiError>;

    /// Overwrites the payment status. The payment lifecycle is independent of the order status state machine.
    async fn set_payment_status(&self, order_id: i64, status: PaymentStatusType) -> Result<Order, OrderApiError>;
}
