//! Marketplace Engine
//!
//! This library contains the core logic for the marketplace backend: the catalog store and its inventory counter,
//! the order ledger and its status state machine, the order placement pipeline, the order transition engine, and
//! the notification channel between buyers and sellers.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You should never need to
//!    access the database directly; use the public API instead. The exception is the data types used in the
//!    database, which are defined in the [`db_types`] module and are public.
//! 2. The engine public API ([`mod@api`]). This provides the public-facing functionality: placing orders,
//!    transitioning them, and exchanging messages. Backends need to implement the traits in [`mod@traits`] to
//!    drive these APIs.
//!
//! The engine also provides a set of events that can be subscribed to. These events are emitted when certain
//! actions occur, e.g. when a new order is committed an `OrderCreated` event is emitted. A simple actor framework
//! is used so that you can hook into these events and perform custom actions.
pub mod api;
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod test_utils;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

pub use api::{
    errors::{ErrorKind, MarketplaceApiError},
    messages_api::MessagesApi,
    order_flow_api::OrderFlowApi,
    order_objects,
};
pub use traits::{
    CatalogApiError,
    CatalogManagement,
    MarketplaceDatabase,
    MarketplaceError,
    MessageApiError,
    MessageManagement,
    OrderApiError,
    OrderManagement,
};
