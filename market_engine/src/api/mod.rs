//! # Marketplace engine public API
//!
//! The `api` module exposes the programmatic API for the marketplace engine.
//!
//! * [`order_flow_api`] is the primary API for the order lifecycle: the placement pipeline (cart validation, price
//!   freeze, atomic stock decrement + order insert, seller fan-out) and the transition engine (approve / reject /
//!   cancel and direct status overwrites, with authorization and stock restoration).
//! * [`messages_api`] is the notification channel between buyers and sellers.
//!
//! The pattern for using the APIs is the same everywhere: an API instance is created by supplying a database
//! backend that implements the backend traits the API requires.
//!
//! ```rust,ignore
//! use market_engine::{OrderFlowApi, SqliteDatabase, events::EventProducers};
//! let db = SqliteDatabase::new_with_url("sqlite://data/market_store.db", 5).await?;
//! let api = OrderFlowApi::new(db, EventProducers::default());
//! let order = api.place_order(buyer, &cart).await?;
//! ```

pub mod errors;
pub mod messages_api;
pub mod order_flow_api;
pub mod order_objects;

pub use errors::{ErrorKind, MarketplaceApiError};
pub use messages_api::MessagesApi;
pub use order_flow_api::OrderFlowApi;
