use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderAction, OrderItem, OrderStatusType};

//--------------------------------------      CartItem      ----------------------------------------------------------
/// One requested line of a cart, before resolution against the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: i64,
    pub quantity: i64,
}

impl CartItem {
    pub fn new(product_id: i64, quantity: i64) -> Self {
        Self { product_id, quantity }
    }
}

//--------------------------------------     OrderChange    ----------------------------------------------------------
/// The requested transition: either a semantic action, or a raw target status (admin/seller escape hatch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderChange {
    Action(OrderAction),
    Status(OrderStatusType),
}

impl Display for OrderChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderChange::Action(a) => write!(f, "action '{a}'"),
            OrderChange::Status(s) => write!(f, "status '{s}'"),
        }
    }
}

//--------------------------------------   OrderWithItems   ----------------------------------------------------------
/// An order together with its line items, as returned by the placement pipeline and the order queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderWithItems {
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        Self { order, items }
    }

    /// The distinct sellers owning at least one line item, in first-appearance order.
    pub fn sellers(&self) -> Vec<i64> {
        let mut sellers = Vec::new();
        for item in &self.items {
            if !sellers.contains(&item.seller_id) {
                sellers.push(item.seller_id);
            }
        }
        sellers
    }
}

//--------------------------------------     Pagination     ----------------------------------------------------------
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    pub offset: i64,
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { offset: 0, limit: 50 }
    }
}

impl Pagination {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self { offset, limit }
    }
}

//--------------------------------------  OrderQueryFilter  ----------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub buyer_id: Option<i64>,
    pub seller_id: Option<i64>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub status: Option<Vec<OrderStatusType>>,
}

impl OrderQueryFilter {
    pub fn with_buyer_id(mut self, buyer_id: i64) -> Self {
        self.buyer_id = Some(buyer_id);
        self
    }

    pub fn with_seller_id(mut self, seller_id: i64) -> Self {
        self.seller_id = Some(seller_id);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.buyer_id.is_none() &&
            self.seller_id.is_none() &&
            self.since.is_none() &&
            self.until.is_none() &&
            self.status.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "No filters.");
        }
        if let Some(id) = self.buyer_id {
            write!(f, "buyer: {id}. ")?;
        }
        if let Some(id) = self.seller_id {
            write!(f, "seller: {id}. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since: {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until: {until}. ")?;
        }
        if let Some(statuses) = &self.status {
            let s = statuses.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
            write!(f, "status: [{s}]. ")?;
        }
        Ok(())
    }
}
