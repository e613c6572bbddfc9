use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewProduct, Product},
    traits::CatalogApiError,
};

const PRODUCT_COLUMNS: &str = "id, seller_id, name, unit, price, stock, created_at, updated_at";

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, CatalogApiError> {
    let sql = format!(
        "INSERT INTO products (seller_id, name, unit, price, stock) VALUES ($1, $2, $3, $4, $5) \
         RETURNING {PRODUCT_COLUMNS}"
    );
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(product.seller_id)
        .bind(product.name)
        .bind(product.unit)
        .bind(product.price)
        .bind(product.stock)
        .fetch_one(conn)
        .await?;
    trace!("🗃️ Product #{} ({}) created with stock {}", product.id, product.name, product.stock);
    Ok(product)
}

pub async fn product_by_id(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, CatalogApiError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
    let product = sqlx::query_as::<_, Product>(&sql).bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn products_for_seller(seller_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Product>, CatalogApiError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE seller_id = $1 ORDER BY id ASC");
    let products = sqlx::query_as::<_, Product>(&sql).bind(seller_id).fetch_all(conn).await?;
    Ok(products)
}

/// Adjusts the stock counter by `delta` with a guarded UPDATE. The guard re-checks the counter as part of the write,
/// so two concurrent decrements competing for the last units serialize correctly: the loser matches no row and gets
/// [`CatalogApiError::InsufficientStock`] without applying anything.
pub async fn adjust_stock(
    product_id: i64,
    delta: i64,
    conn: &mut SqliteConnection,
) -> Result<Product, CatalogApiError> {
    let sql = format!(
        "UPDATE products SET stock = stock + $1, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $2 AND stock + $3 >= 0 \
         RETURNING {PRODUCT_COLUMNS}"
    );
    let updated = sqlx::query_as::<_, Product>(&sql)
        .bind(delta)
        .bind(product_id)
        .bind(delta)
        .fetch_optional(&mut *conn)
        .await?;
    match updated {
        Some(product) => {
            trace!("🗃️ Product #{product_id} stock adjusted by {delta} to {}", product.stock);
            Ok(product)
        },
        None => match product_by_id(product_id, conn).await? {
            Some(product) => Err(CatalogApiError::InsufficientStock {
                product_id,
                requested: -delta,
                available: product.stock,
            }),
            None => Err(CatalogApiError::ProductNotFound(product_id)),
        },
    }
}
