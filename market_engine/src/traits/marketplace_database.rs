use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderItem, OrderStatusType},
    traits::{CatalogApiError, CatalogManagement, MessageApiError, MessageManagement, OrderApiError, OrderManagement},
};

#[derive(Debug, Clone, Error)]
pub enum MarketplaceError {
    #[error("We have an internal database engine (configuration/uptime etc.) error: {0}")]
    DatabaseError(String),
    #[error("{0}")]
    CatalogError(#[from] CatalogApiError),
    #[error("{0}")]
    OrderError(#[from] OrderApiError),
    #[error("{0}")]
    MessageError(#[from] MessageApiError),
    #[error("Order {order_id} is {status} and cannot be modified this way")]
    OrderModificationForbidden { order_id: i64, status: OrderStatusType },
    #[error("An order must contain at least one line item")]
    EmptyOrder,
}

impl From<sqlx::Error> for MarketplaceError {
    fn from(e: sqlx::Error) -> Self {
        MarketplaceError::DatabaseError(e.to_string())
    }
}

/// This trait defines the highest level of behaviour for backends supporting the marketplace engine.
///
/// On top of the catalog, ledger and message contracts it adds the two units of work that must be atomic:
/// * order insertion together with its stock decrements, and
/// * cancellation together with its stock restoration.
///
/// Either everything in one of these units applies, or nothing does. The placement pipeline and the transition
/// engine in [`crate::api::OrderFlowApi`] rely on these guarantees and add no locking of their own.
#[allow(async_fn_in_trait)]
pub trait MarketplaceDatabase: Clone + CatalogManagement + OrderManagement + MessageManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Takes a resolved, priced order and, in a single atomic transaction:
    /// * decrements each product's stock by the ordered quantity, re-checking availability as part of the decrement
    ///   so a competing order cannot interleave, and
    /// * inserts the order record and its line items.
    ///
    /// Returns the stored order and items. On any failure the transaction rolls back and no stock is decremented.
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, Vec<OrderItem>), MarketplaceError>;

    /// Moves a `Pending` order to `Cancelled` and restores the stock of every line item, in a single atomic
    /// transaction. A line item whose product no longer exists is skipped, not fatal.
    ///
    /// The `Pending` check happens inside the transaction, so a repeated call observes `Cancelled` and fails with
    /// [`MarketplaceError::OrderModificationForbidden`] rather than restoring stock twice.
    async fn cancel_order(&self, order_id: i64) -> Result<(Order, Vec<OrderItem>), MarketplaceError>;

    /// Overwrites the order status with no side effects. Refused for orders already in a terminal status.
    async fn update_order_status(&self, order_id: i64, status: OrderStatusType) -> Result<Order, MarketplaceError>;

    async fn close(&mut self) -> Result<(), MarketplaceError>;
}
