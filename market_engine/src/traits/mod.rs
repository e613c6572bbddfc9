//! # Backend contracts for the marketplace engine.
//!
//! This module defines the interface contracts that storage *backends* must satisfy to drive the engine.
//!
//! ## Traits
//! * [`CatalogManagement`] owns product records and the guarded stock counter. All stock mutation in the engine goes
//!   through [`CatalogManagement::adjust_stock`], which centrally enforces that stock never goes negative.
//! * [`OrderManagement`] provides queries over the order ledger and the payment-status update used by the (external)
//!   payment collaborator.
//! * [`MessageManagement`] is the notification channel: an append-only message log with read-state tracking.
//! * [`MarketplaceDatabase`] is the top-level contract. It adds the two flows that must be atomic: order insertion
//!   with its stock decrements, and cancellation with its stock restoration.
mod catalog_management;
mod marketplace_database;
mod message_management;
mod order_management;

pub use catalog_management::{CatalogApiError, CatalogManagement};
pub use marketplace_database::{MarketplaceDatabase, MarketplaceError};
pub use message_management::{MessageApiError, MessageManagement};
pub use order_management::{OrderApiError, OrderManagement};
