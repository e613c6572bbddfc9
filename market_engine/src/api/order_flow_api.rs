use std::fmt::Debug;

use log::*;

use crate::{
    api::{
        errors::MarketplaceApiError,
        order_objects::{CartItem, OrderChange, OrderQueryFilter, OrderWithItems, Pagination},
    },
    db_types::{
        BuyerId,
        NewMessage,
        NewOrder,
        NewOrderItem,
        Order,
        OrderAction,
        OrderItem,
        OrderStatusType,
        PaymentStatusType,
        Role,
    },
    events::{EventProducers, OrderAnnulledEvent, OrderCreatedEvent},
    helpers::seller_order_summary,
    traits::MarketplaceDatabase,
};

/// `OrderFlowApi` is the primary API for the order lifecycle: placing orders against the catalog and transitioning
/// them through the status state machine.
///
/// The placement pipeline validates a cart, freezes prices, commits the stock decrements and the order record as
/// one atomic unit (delegated to [`MarketplaceDatabase::insert_order`]), and then fans out one notification per
/// affected seller. Fan-out is strictly best-effort: the order is already committed, so a delivery failure is
/// logged and swallowed.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> OrderFlowApi<B>
where B: MarketplaceDatabase
{
    /// Place a new order for the given buyer.
    ///
    /// Steps:
    /// 1. Reject empty carts and non-positive quantities before touching the database. Duplicate lines for the same
    ///    product are merged.
    /// 2. Resolve every product and check the requested quantity against current stock. The unit price and product
    ///    name are frozen here; later catalog changes do not affect the order.
    /// 3. Commit the stock decrements and the order insert as one atomic unit. The decrements re-check availability
    ///    inside the transaction, so a concurrent competing order cannot make stock go negative.
    /// 4. Notify each seller with at least one line item in the order, and publish an `OrderCreated` event.
    pub async fn place_order(&self, buyer: BuyerId, cart: &[CartItem]) -> Result<OrderWithItems, MarketplaceApiError> {
        let cart = validate_cart(cart)?;
        let mut items = Vec::with_capacity(cart.len());
        for line in &cart {
            let product = self
                .db
                .fetch_product(line.product_id)
                .await
                .map_err(MarketplaceApiError::from)?
                .ok_or(MarketplaceApiError::ProductNotFound(line.product_id))?;
            if product.stock < line.quantity {
                return Err(MarketplaceApiError::InsufficientStock {
                    product_id: product.id,
                    requested: line.quantity,
                    available: product.stock,
                });
            }
            items.push(NewOrderItem {
                product_id: product.id,
                seller_id: product.seller_id,
                product_name: product.name,
                quantity: line.quantity,
                unit_price: product.price,
            });
        }
        let new_order = NewOrder::new(buyer, items);
        let (order, items) = self.db.insert_order(new_order).await?;
        info!("📦️ Order #{} placed: {} line item(s), total {}", order.id, items.len(), order.total_amount);
        let result = OrderWithItems::new(order, items);
        self.notify_sellers(&result).await;
        self.call_order_created_hook(&result).await;
        Ok(result)
    }

    /// Transition an order, either via a semantic action (approve/reject/cancel) or a direct status assignment.
    ///
    /// Authorization, first match wins:
    /// * `Admin` is always authorized.
    /// * `Seller` is authorized iff at least one line item's product belongs to the caller.
    /// * A buyer is authorized only to cancel their own order while it is still `Pending`.
    ///
    /// `Approve` moves `Pending` to `Confirmed`. `Reject` and `Cancel` move `Pending` to `Cancelled` and restore
    /// the stock of every line item atomically with the status write; repeating the call fails with
    /// `InvalidTransition` because the order is no longer `Pending`, so stock is never restored twice.
    ///
    /// Direct status assignment is a plain overwrite with no side effects, with two restrictions: `Cancelled`
    /// orders are terminal, and a direct jump *to* `Cancelled` is refused since it would bypass stock restoration —
    /// use `OrderChange::Action(Cancel)` instead.
    pub async fn transition_order(
        &self,
        order_id: i64,
        caller_id: i64,
        role: Role,
        change: OrderChange,
    ) -> Result<Order, MarketplaceApiError> {
        let order = self
            .db
            .fetch_order(order_id)
            .await
            .map_err(MarketplaceApiError::from)?
            .ok_or(MarketplaceApiError::OrderNotFound(order_id))?;
        let items = self.db.fetch_order_items(order_id).await.map_err(MarketplaceApiError::from)?;
        authorize(&order, &items, caller_id, role, change)?;
        self.apply_transition(order, change).await
    }

    /// Handle a seller replying to a system-generated order notification with an action verb. Delegates into the
    /// transition engine and then marks the originating notification as read.
    pub async fn handle_order_reply(
        &self,
        message_id: i64,
        caller_id: i64,
        action: OrderAction,
    ) -> Result<Order, MarketplaceApiError> {
        let message = self
            .db
            .fetch_message(message_id)
            .await
            .map_err(MarketplaceApiError::from)?
            .ok_or(MarketplaceApiError::MessageNotFound(message_id))?;
        let order_id = message
            .order_id
            .ok_or_else(|| MarketplaceApiError::invalid_input(format!("Message {message_id} is not linked to an order")))?;
        let order = self.transition_order(order_id, caller_id, Role::Seller, OrderChange::Action(action)).await?;
        // The transition has committed. A failure to flip the read flag should not misreport that as a failed
        // transition, so it is logged and swallowed.
        if let Err(e) = self.db.mark_message_read(message_id).await {
            warn!("📦️ Order #{order_id} transitioned, but message #{message_id} could not be marked read: {e}");
        }
        Ok(order)
    }

    /// Orders placed by the given registered buyer, newest first.
    pub async fn orders_for_buyer(
        &self,
        buyer_id: i64,
        pagination: Pagination,
    ) -> Result<Vec<Order>, MarketplaceApiError> {
        let orders = self.db.orders_for_buyer(buyer_id, pagination).await.map_err(MarketplaceApiError::from)?;
        Ok(orders)
    }

    /// Orders containing at least one line item the given seller owns, newest first.
    pub async fn orders_for_seller(&self, seller_id: i64) -> Result<Vec<Order>, MarketplaceApiError> {
        let orders = self.db.orders_for_seller(seller_id).await.map_err(MarketplaceApiError::from)?;
        Ok(orders)
    }

    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, MarketplaceApiError> {
        let orders = self.db.search_orders(query).await.map_err(MarketplaceApiError::from)?;
        Ok(orders)
    }

    pub async fn order_with_items(&self, order_id: i64) -> Result<OrderWithItems, MarketplaceApiError> {
        let order = self
            .db
            .fetch_order(order_id)
            .await
            .map_err(MarketplaceApiError::from)?
            .ok_or(MarketplaceApiError::OrderNotFound(order_id))?;
        let items = self.db.fetch_order_items(order_id).await.map_err(MarketplaceApiError::from)?;
        Ok(OrderWithItems::new(order, items))
    }

    /// Overwrite the payment status of an order. Reserved for the payment collaborator; the payment lifecycle is
    /// independent of the order status state machine.
    pub async fn update_payment_status(
        &self,
        order_id: i64,
        status: PaymentStatusType,
    ) -> Result<Order, MarketplaceApiError> {
        let order = self.db.set_payment_status(order_id, status).await.map_err(MarketplaceApiError::from)?;
        Ok(order)
    }

    async fn apply_transition(&self, order: Order, change: OrderChange) -> Result<Order, MarketplaceApiError> {
        let order_id = order.id;
        match change {
            OrderChange::Action(OrderAction::Approve) => {
                if order.status != OrderStatusType::Pending {
                    return Err(invalid_transition(&order, change));
                }
                let order = self.db.update_order_status(order_id, OrderStatusType::Confirmed).await?;
                info!("📦️ Order #{order_id} approved");
                Ok(order)
            },
            OrderChange::Action(OrderAction::Reject | OrderAction::Cancel) => {
                if order.status != OrderStatusType::Pending {
                    return Err(invalid_transition(&order, change));
                }
                let (order, items) = self.db.cancel_order(order_id).await?;
                info!("📦️ Order #{order_id} annulled. Stock restored for {} line item(s)", items.len());
                self.call_order_annulled_hook(&order).await;
                Ok(order)
            },
            OrderChange::Status(new_status) => {
                if order.status.is_terminal() || new_status == OrderStatusType::Cancelled {
                    // A direct jump to Cancelled would bypass stock restoration. Cancellation goes through the
                    // action path only.
                    return Err(invalid_transition(&order, change));
                }
                let order = self.db.update_order_status(order_id, new_status).await?;
                debug!("📦️ Order #{order_id} status set directly to {new_status}");
                Ok(order)
            },
        }
    }

    async fn notify_sellers(&self, order: &OrderWithItems) {
        let order_id = order.order.id;
        for seller_id in order.sellers() {
            let seller_items: Vec<OrderItem> =
                order.items.iter().filter(|i| i.seller_id == seller_id).cloned().collect();
            let content = seller_order_summary(order_id, &seller_items);
            let message = NewMessage::new(None, seller_id, content).with_order(order_id);
            match self.db.send_message(message).await {
                Ok(m) => trace!("📦️ Seller #{seller_id} notified of order #{order_id} (message #{})", m.id),
                Err(e) => warn!("📦️ Could not notify seller #{seller_id} of order #{order_id}: {e}"),
            }
        }
    }

    async fn call_order_created_hook(&self, order: &OrderWithItems) {
        for emitter in &self.producers.order_created_producer {
            debug!("📦️ Notifying order created hook subscribers");
            let event = OrderCreatedEvent::new(order.order.clone(), order.items.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_order_annulled_hook(&self, order: &Order) {
        for emitter in &self.producers.order_annulled_producer {
            debug!("📦️ Notifying order annulled hook subscribers");
            let event = OrderAnnulledEvent::new(order.clone());
            emitter.publish_event(event).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

fn invalid_transition(order: &Order, change: OrderChange) -> MarketplaceApiError {
    MarketplaceApiError::InvalidTransition { order_id: order.id, status: order.status, change: change.to_string() }
}

/// Input validation for a requested cart: non-empty, positive quantities, duplicate product lines merged.
fn validate_cart(cart: &[CartItem]) -> Result<Vec<CartItem>, MarketplaceApiError> {
    if cart.is_empty() {
        return Err(MarketplaceApiError::invalid_input("The cart must contain at least one item"));
    }
    let mut merged: Vec<CartItem> = Vec::with_capacity(cart.len());
    for line in cart {
        if line.quantity <= 0 {
            return Err(MarketplaceApiError::invalid_input(format!(
                "Quantity for product {} must be positive, got {}",
                line.product_id, line.quantity
            )));
        }
        match merged.iter_mut().find(|l| l.product_id == line.product_id) {
            Some(existing) => existing.quantity += line.quantity,
            None => merged.push(*line),
        }
    }
    Ok(merged)
}

fn authorize(
    order: &Order,
    items: &[OrderItem],
    caller_id: i64,
    role: Role,
    change: OrderChange,
) -> Result<(), MarketplaceApiError> {
    match role {
        Role::Admin => Ok(()),
        Role::Seller => {
            if items.iter().any(|i| i.seller_id == caller_id) {
                Ok(())
            } else {
                Err(MarketplaceApiError::unauthorized(format!(
                    "Seller {caller_id} owns no products in order {}",
                    order.id
                )))
            }
        },
        Role::Buyer => {
            let owns_order = order.buyer_id == Some(caller_id);
            let is_self_cancel = matches!(change, OrderChange::Action(OrderAction::Cancel));
            if owns_order && is_self_cancel && order.status == OrderStatusType::Pending {
                Ok(())
            } else {
                Err(MarketplaceApiError::unauthorized(format!(
                    "Buyer {caller_id} may only cancel their own pending orders"
                )))
            }
        },
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use mkt_common::Money;

    use super::*;
    use crate::db_types::PaymentStatusType;

    fn order(id: i64, buyer_id: Option<i64>, status: OrderStatusType) -> Order {
        Order {
            id,
            buyer_id,
            buyer_contact: None,
            total_amount: Money::from(4500),
            status,
            payment_status: PaymentStatusType::Unpaid,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn item(order_id: i64, seller_id: i64) -> OrderItem {
        OrderItem {
            id: 1,
            order_id,
            product_id: 1,
            seller_id,
            product_name: "Apples".into(),
            quantity: 3,
            unit_price: Money::from(1500),
        }
    }

    #[test]
    fn empty_cart_is_rejected() {
        let err = validate_cart(&[]).unwrap_err();
        assert!(matches!(err, MarketplaceApiError::InvalidInput(_)));
    }

    #[test]
    fn non_positive_quantities_are_rejected() {
        for qty in [0, -3] {
            let err = validate_cart(&[CartItem::new(1, qty)]).unwrap_err();
            assert!(matches!(err, MarketplaceApiError::InvalidInput(_)));
        }
    }

    #[test]
    fn duplicate_cart_lines_are_merged() {
        let cart = validate_cart(&[CartItem::new(1, 2), CartItem::new(2, 1), CartItem::new(1, 3)]).unwrap();
        assert_eq!(cart, vec![CartItem::new(1, 5), CartItem::new(2, 1)]);
    }

    #[test]
    fn admin_is_always_authorized() {
        let o = order(1, None, OrderStatusType::Confirmed);
        let items = [item(1, 10)];
        assert!(authorize(&o, &items, 999, Role::Admin, OrderChange::Status(OrderStatusType::Shipped)).is_ok());
    }

    #[test]
    fn seller_needs_a_line_item_in_the_order() {
        let o = order(1, Some(5), OrderStatusType::Pending);
        let items = [item(1, 10)];
        assert!(authorize(&o, &items, 10, Role::Seller, OrderChange::Action(OrderAction::Approve)).is_ok());
        let err = authorize(&o, &items, 11, Role::Seller, OrderChange::Action(OrderAction::Approve)).unwrap_err();
        assert!(matches!(err, MarketplaceApiError::Unauthorized(_)));
    }

    #[test]
    fn buyer_may_only_self_cancel_pending_orders() {
        let items = [item(1, 10)];
        let pending = order(1, Some(5), OrderStatusType::Pending);
        assert!(authorize(&pending, &items, 5, Role::Buyer, OrderChange::Action(OrderAction::Cancel)).is_ok());
        // someone else's order
        let err = authorize(&pending, &items, 6, Role::Buyer, OrderChange::Action(OrderAction::Cancel)).unwrap_err();
        assert!(matches!(err, MarketplaceApiError::Unauthorized(_)));
        // not an approve path
        let err = authorize(&pending, &items, 5, Role::Buyer, OrderChange::Action(OrderAction::Approve)).unwrap_err();
        assert!(matches!(err, MarketplaceApiError::Unauthorized(_)));
        // no longer pending
        let confirmed = order(1, Some(5), OrderStatusType::Confirmed);
        let err = authorize(&confirmed, &items, 5, Role::Buyer, OrderChange::Action(OrderAction::Cancel)).unwrap_err();
        assert!(matches!(err, MarketplaceApiError::Unauthorized(_)));
    }
}
