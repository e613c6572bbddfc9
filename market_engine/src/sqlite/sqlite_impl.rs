//! `SqliteDatabase` is a concrete implementation of a marketplace engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{db_url, messages, new_pool, orders, products};
use crate::{
    api::order_objects::{OrderQueryFilter, Pagination},
    db_types::{
        Message,
        NewMessage,
        NewOrder,
        NewProduct,
        Order,
        OrderItem,
        OrderStatusType,
        PaymentStatusType,
        Product,
    },
    traits::{
        CatalogApiError,
        CatalogManagement,
        MarketplaceDatabase,
        MarketplaceError,
        MessageApiError,
        MessageManagement,
        OrderApiError,
        OrderManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL from the environment (`MKT_DATABASE_URL`).
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl MarketplaceDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<(Order, Vec<OrderItem>), MarketplaceError> {
        if order.items.is_empty() {
            return Err(MarketplaceError::EmptyOrder);
        }
        let mut tx = self.pool.begin().await?;
        // The guarded decrement re-checks availability inside the transaction. Any failure here aborts the whole
        // placement with no stock applied.
        for item in &order.items {
            products::adjust_stock(item.product_id, -item.quantity, &mut tx).await?;
        }
        let (stored, items) = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{} committed. Stock decremented for {} line item(s)", stored.id, items.len());
        Ok((stored, items))
    }

    async fn cancel_order(&self, order_id: i64) -> Result<(Order, Vec<OrderItem>), MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::order_by_id(order_id, &mut tx)
            .await?
            .ok_or(OrderApiError::OrderNotFound(order_id))?;
        // The Pending gate lives inside the transaction so a repeated cancellation cannot double-restore stock.
        if order.status != OrderStatusType::Pending {
            return Err(MarketplaceError::OrderModificationForbidden { order_id, status: order.status });
        }
        let items = orders::items_for_order(order_id, &mut tx).await?;
        for item in &items {
            match products::adjust_stock(item.product_id, item.quantity, &mut tx).await {
                Ok(product) => {
                    trace!("🗃️ Restored {} unit(s) of product #{}. Stock is now {}", item.quantity, product.id, product.stock)
                },
                Err(CatalogApiError::ProductNotFound(id)) => {
                    warn!("🗃️ Product #{id} no longer exists. Skipping stock restoration for that line item.")
                },
                Err(e) => return Err(e.into()),
            }
        }
        let order = orders::update_order_status(order_id, OrderStatusType::Cancelled, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{order_id} cancelled and stock restored for {} line item(s)", items.len());
        Ok((order, items))
    }

    async fn update_order_status(&self, order_id: i64, status: OrderStatusType) -> Result<Order, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::order_by_id(order_id, &mut tx)
            .await?
            .ok_or(OrderApiError::OrderNotFound(order_id))?;
        if order.status.is_terminal() {
            return Err(MarketplaceError::OrderModificationForbidden { order_id, status: order.status });
        }
        let order = orders::update_order_status(order_id, status, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn close(&mut self) -> Result<(), MarketplaceError> {
        self.pool.close().await;
        Ok(())
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn create_product(&self, product: NewProduct) -> Result<Product, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        products::insert_product(product, &mut conn).await
    }

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        products::product_by_id(product_id, &mut conn).await
    }

    async fn products_for_seller(&self, seller_id: i64) -> Result<Vec<Product>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        products::products_for_seller(seller_id, &mut conn).await
    }

    async fn adjust_stock(&self, product_id: i64, delta: i64) -> Result<Product, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        products::adjust_stock(product_id, delta, &mut conn).await
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        orders::order_by_id(order_id, &mut conn).await
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        orders::items_for_order(order_id, &mut conn).await
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        orders::search_orders(query, &mut conn).await
    }

    async fn orders_for_buyer(&self, buyer_id: i64, pagination: Pagination) -> Result<Vec<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        orders::orders_for_buyer(buyer_id, pagination, &mut conn).await
    }

    async fn orders_for_seller(&self, seller_id: i64) -> Result<Vec<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        orders::orders_for_seller(seller_id, &mut conn).await
    }

    async fn set_payment_status(&self, order_id: i64, status: PaymentStatusType) -> Result<Order, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_payment_status(order_id, status, &mut conn).await
    }
}

impl MessageManagement for SqliteDatabase {
    async fn send_message(&self, message: NewMessage) -> Result<Message, MessageApiError> {
        let mut conn = self.pool.acquire().await?;
        messages::insert_message(message, &mut conn).await
    }

    async fn fetch_message(&self, message_id: i64) -> Result<Option<Message>, MessageApiError> {
        let mut conn = self.pool.acquire().await?;
        messages::message_by_id(message_id, &mut conn).await
    }

    async fn messages_for_user(&self, user_id: i64) -> Result<Vec<Message>, MessageApiError> {
        let mut conn = self.pool.acquire().await?;
        messages::messages_for_user(user_id, &mut conn).await
    }

    async fn conversation(
        &self,
        user_a: i64,
        user_b: i64,
        product_id: Option<i64>,
    ) -> Result<Vec<Message>, MessageApiError> {
        let mut conn = self.pool.acquire().await?;
        messages::conversation(user_a, user_b, product_id, &mut conn).await
    }

    async fn mark_read(&self, from_user: Option<i64>, to_user: i64) -> Result<u64, MessageApiError> {
        let mut conn = self.pool.acquire().await?;
        messages::mark_read(from_user, to_user, &mut conn).await
    }

    async fn mark_message_read(&self, message_id: i64) -> Result<(), MessageApiError> {
        let mut conn = self.pool.acquire().await?;
        messages::mark_message_read(message_id, &mut conn).await
    }
}
