#![allow(dead_code)]
use market_engine::{
    db_types::{NewProduct, Product},
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    CatalogManagement,
    OrderFlowApi,
    SqliteDatabase,
};
use mkt_common::Money;

/// Creates a fresh, fully migrated database for one test.
pub async fn new_test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

pub fn flow_api(db: SqliteDatabase) -> OrderFlowApi<SqliteDatabase> {
    OrderFlowApi::new(db, EventProducers::default())
}

pub async fn seed_product(db: &SqliteDatabase, seller_id: i64, name: &str, price: i64, stock: i64) -> Product {
    db.create_product(NewProduct::new(seller_id, name, Money::from(price), stock))
        .await
        .expect("Error seeding product")
}

pub async fn stock_of(db: &SqliteDatabase, product_id: i64) -> i64 {
    db.fetch_product(product_id)
        .await
        .expect("Error fetching product")
        .expect("Product should exist")
        .stock
}
