//! Product inventory reads and the checkout stock decrement.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::product::Product;
use crate::types::ProductId;

const PRODUCT_SELECT: &str = "SELECT p.id, p.store_id, p.name, p.description, p.price, p.quantity, \
     p.total_sold, p.is_active, s.is_active AS store_active, p.photo_url, p.created_at, p.updated_at \
     FROM products p JOIN stores s ON s.id = p.store_id";

/// Loads a product for the public catalog; only purchasable products are visible.
pub async fn find_purchasable(pool: &PgPool, id: ProductId) -> Result<Option<Product>, sqlx::Error> {
    let query = format!(
        "{} WHERE p.id = $1 AND p.is_active = TRUE AND s.is_active = TRUE",
        PRODUCT_SELECT
    );
    sqlx::query_as::<_, Product>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Loads a product and locks its row until the surrounding transaction ends.
pub async fn lock_by_id(
    conn: &mut PgConnection,
    id: ProductId,
) -> Result<Option<Product>, sqlx::Error> {
    let query = format!("{} WHERE p.id = $1 FOR UPDATE OF p", PRODUCT_SELECT);
    sqlx::query_as::<_, Product>(&query)
        .bind(id)
        .fetch_optional(conn)
        .await
}

/// Locks several product rows in id order so concurrent checkouts cannot deadlock.
pub async fn lock_many(
    conn: &mut PgConnection,
    ids: &[ProductId],
) -> Result<Vec<Product>, sqlx::Error> {
    let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
    let query = format!(
        "{} WHERE p.id = ANY($1) ORDER BY p.id FOR UPDATE OF p",
        PRODUCT_SELECT
    );
    sqlx::query_as::<_, Product>(&query)
        .bind(ids)
        .fetch_all(conn)
        .await
}

/// Takes `quantity` units out of stock and counts them as sold.
///
/// Returns `false` without touching the row when fewer than `quantity` units
/// remain.
pub async fn decrement_stock(
    conn: &mut PgConnection,
    id: ProductId,
    quantity: i32,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE products SET quantity = quantity - $2, total_sold = total_sold + $2, \
         updated_at = NOW() WHERE id = $1 AND quantity >= $2",
    )
    .bind(id)
    .bind(quantity)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
