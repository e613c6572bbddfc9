use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderItem, OrderStatusType};

/// Emitted after the placement transaction has committed. Consumers must treat this as strictly post-hoc: the order
/// exists whether or not any consumer runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderCreatedEvent {
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        Self { order, items }
    }
}

/// Emitted after an order has been rejected or cancelled and its stock restored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAnnulledEvent {
    pub order: Order,
    pub status: OrderStatusType,
}

impl OrderAnnulledEvent {
    pub fn new(order: Order) -> Self {
        let status = order.status;
        Self { order, status }
    }
}

#[derive(Debug, Clone)]
pub enum EventType {
    OrderCreated(OrderCreatedEvent),
    OrderAnnulled(OrderAnnulledEvent),
}
