use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    db_types::OrderStatusType,
    traits::{CatalogApiError, MarketplaceError, MessageApiError, OrderApiError},
};

/// The stable, machine-checkable classification of an API error. Callers branch on the kind; the error message is
/// for humans only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    InsufficientStock,
    Unauthorized,
    InvalidTransition,
    Internal,
}

impl ErrorKind {
    /// Only storage/transaction failures are worth retrying. Everything else will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Internal)
    }
}

/// Caller-facing error for the engine APIs.
#[derive(Debug, Clone, Error)]
pub enum MarketplaceApiError {
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Message {0} does not exist")]
    MessageNotFound(i64),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock { product_id: i64, requested: i64, available: i64 },
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Order {order_id} is {status}: {change} is not a legal transition")]
    InvalidTransition { order_id: i64, status: OrderStatusType, change: String },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MarketplaceApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MarketplaceApiError::ProductNotFound(_) |
            MarketplaceApiError::OrderNotFound(_) |
            MarketplaceApiError::MessageNotFound(_) => ErrorKind::NotFound,
            MarketplaceApiError::InvalidInput(_) => ErrorKind::InvalidInput,
            MarketplaceApiError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            MarketplaceApiError::Unauthorized(_) => ErrorKind::Unauthorized,
            MarketplaceApiError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            MarketplaceApiError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn unauthorized<S: Into<String>>(reason: S) -> Self {
        MarketplaceApiError::Unauthorized(reason.into())
    }

    pub fn invalid_input<S: Into<String>>(reason: S) -> Self {
        MarketplaceApiError::InvalidInput(reason.into())
    }
}

impl From<CatalogApiError> for MarketplaceApiError {
    fn from(e: CatalogApiError) -> Self {
        match e {
            CatalogApiError::DatabaseError(msg) => MarketplaceApiError::Internal(msg),
            CatalogApiError::ProductNotFound(id) => MarketplaceApiError::ProductNotFound(id),
            CatalogApiError::InsufficientStock { product_id, requested, available } => {
                MarketplaceApiError::InsufficientStock { product_id, requested, available }
            },
        }
    }
}

impl From<OrderApiError> for MarketplaceApiError {
    fn from(e: OrderApiError) -> Self {
        match e {
            OrderApiError::DatabaseError(msg) => MarketplaceApiError::Internal(msg),
            OrderApiError::OrderNotFound(id) => MarketplaceApiError::OrderNotFound(id),
            OrderApiError::QueryError(msg) => MarketplaceApiError::InvalidInput(msg),
        }
    }
}

impl From<MessageApiError> for MarketplaceApiError {
    fn from(e: MessageApiError) -> Self {
        match e {
            MessageApiError::DatabaseError(msg) => MarketplaceApiError::Internal(msg),
            MessageApiError::MessageNotFound(id) => MarketplaceApiError::MessageNotFound(id),
        }
    }
}

impl From<MarketplaceError> for MarketplaceApiError {
    fn from(e: MarketplaceError) -> Self {
        match e {
            MarketplaceError::DatabaseError(msg) => MarketplaceApiError::Internal(msg),
            MarketplaceError::CatalogError(e) => e.into(),
            MarketplaceError::OrderError(e) => e.into(),
            MarketplaceError::MessageError(e) => e.into(),
            MarketplaceError::OrderModificationForbidden { order_id, status } => {
                MarketplaceApiError::InvalidTransition { order_id, status, change: "modification".to_string() }
            },
            MarketplaceError::EmptyOrder => MarketplaceApiError::invalid_input("An order must contain at least one line item"),
        }
    }
}
