mod support;

use std::sync::Arc;

use log::*;
use market_engine::{db_types::BuyerId, order_objects::CartItem, ErrorKind};
use tokio::runtime::Runtime;

use support::{flow_api, new_test_db, seed_product, stock_of};

const STARTING_STOCK: i64 = 10;
const NUM_ORDERS: i64 = 20;

#[test]
fn burst_orders_never_oversell() {
    info!("🚀️ Starting order injection test");

    let sys = Runtime::new().unwrap();

    sys.block_on(async move {
        let db = new_test_db().await;
        let apples = seed_product(&db, 10, "Apples", 1500, STARTING_STOCK).await;
        let api = Arc::new(flow_api(db.clone()));

        info!("🚀️ Injecting {NUM_ORDERS} concurrent orders against {STARTING_STOCK} units of stock");
        let mut handles = Vec::with_capacity(NUM_ORDERS as usize);
        for i in 0..NUM_ORDERS {
            let api = Arc::clone(&api);
            let product_id = apples.id;
            handles.push(tokio::spawn(async move {
                api.place_order(BuyerId::Registered(i + 1), &[CartItem::new(product_id, 1)]).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            match handle.await.expect("Task panicked") {
                Ok(order) => {
                    successes += 1;
                    debug!("🚀️ Order #{} placed", order.order.id);
                },
                Err(e) => {
                    assert_eq!(e.kind(), ErrorKind::InsufficientStock, "Unexpected failure: {e}");
                },
            }
        }
        assert_eq!(successes, STARTING_STOCK);
        assert_eq!(stock_of(&db, apples.id).await, 0);
    });
    info!("🚀️ test complete");
}

#[test]
fn last_unit_is_sold_exactly_once() {
    let sys = Runtime::new().unwrap();

    sys.block_on(async move {
        let db = new_test_db().await;
        let apples = seed_product(&db, 10, "Apples", 1500, 1).await;
        let api = Arc::new(flow_api(db.clone()));

        let a = {
            let api = Arc::clone(&api);
            let pid = apples.id;
            tokio::spawn(async move { api.place_order(BuyerId::Registered(1), &[CartItem::new(pid, 1)]).await })
        };
        let b = {
            let api = Arc::clone(&api);
            let pid = apples.id;
            tokio::spawn(async move { api.place_order(BuyerId::Registered(2), &[CartItem::new(pid, 1)]).await })
        };
        let results = [a.await.unwrap(), b.await.unwrap()];
        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1, "Exactly one of the competing placements must succeed");
        for r in results.iter().filter(|r| r.is_err()) {
            assert_eq!(r.as_ref().unwrap_err().kind(), ErrorKind::InsufficientStock);
        }
        assert_eq!(stock_of(&db, apples.id).await, 0);
    });
}
