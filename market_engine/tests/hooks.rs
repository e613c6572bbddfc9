mod support;

use std::{future::Future, pin::Pin, time::Duration};

use market_engine::{
    db_types::{BuyerId, OrderAction, OrderStatusType, Role},
    events::{EventHandlers, EventHooks, OrderAnnulledEvent, OrderCreatedEvent},
    order_objects::{CartItem, OrderChange},
    OrderFlowApi,
};
use support::{new_test_db, seed_product};

#[tokio::test]
async fn order_hooks_fire_after_commit() {
    let db = new_test_db().await;
    let apples = seed_product(&db, 10, "Apples", 1500, 5).await;

    let (created_tx, mut created_rx) = tokio::sync::mpsc::channel::<i64>(8);
    let (annulled_tx, mut annulled_rx) = tokio::sync::mpsc::channel::<(i64, OrderStatusType)>(8);
    let mut hooks = EventHooks::default();
    hooks.on_order_created(move |ev: OrderCreatedEvent| {
        let tx = created_tx.clone();
        Box::pin(async move {
            let _ = tx.send(ev.order.id).await;
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks.on_order_annulled(move |ev: OrderAnnulledEvent| {
        let tx = annulled_tx.clone();
        Box::pin(async move {
            let _ = tx.send((ev.order.id, ev.status)).await;
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let handlers = EventHandlers::new(8, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let api = OrderFlowApi::new(db, producers);
    let placed = api.place_order(BuyerId::Registered(1), &[CartItem::new(apples.id, 2)]).await.unwrap();
    let created_id = tokio::time::timeout(Duration::from_secs(5), created_rx.recv())
        .await
        .expect("Created hook should fire")
        .expect("Channel should be open");
    assert_eq!(created_id, placed.order.id);

    api.transition_order(placed.order.id, 1, Role::Buyer, OrderChange::Action(OrderAction::Cancel)).await.unwrap();
    let (annulled_id, status) = tokio::time::timeout(Duration::from_secs(5), annulled_rx.recv())
        .await
        .expect("Annulled hook should fire")
        .expect("Channel should be open");
    assert_eq!(annulled_id, placed.order.id);
    assert_eq!(status, OrderStatusType::Cancelled);
}
