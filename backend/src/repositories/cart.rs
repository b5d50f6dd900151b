//! Cart and cart line persistence. All functions run on a caller-provided
//! connection so the cart engine can compose them inside one transaction.

use rust_decimal::Decimal;
use sqlx::PgConnection;

use crate::models::cart::{CartLine, CartRow};
use crate::types::{CartId, CartLineId, ProductId, UserId};

const LINE_SELECT: &str = "SELECT l.id, l.cart_id, l.product_id, p.name AS product_name, \
     p.photo_url AS product_photo_url, l.quantity, l.unit_price, l.created_at, l.updated_at \
     FROM cart_lines l JOIN products p ON p.id = l.product_id";

/// Returns the user's cart, creating it first when missing. The cart row is
/// locked so concurrent operations on the same cart run one after another.
pub async fn get_or_create_locked(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<CartRow, sqlx::Error> {
    sqlx::query("INSERT INTO carts (id, user_id) VALUES ($1, $2) ON CONFLICT (user_id) DO NOTHING")
        .bind(CartId::new())
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query_as::<_, CartRow>(
        "SELECT id, user_id, created_at, updated_at FROM carts WHERE user_id = $1 FOR UPDATE",
    )
    .bind(user_id)
    .fetch_one(conn)
    .await
}

pub async fn load_lines(
    conn: &mut PgConnection,
    cart_id: CartId,
) -> Result<Vec<CartLine>, sqlx::Error> {
    let query = format!(
        "{} WHERE l.cart_id = $1 ORDER BY l.created_at, l.id",
        LINE_SELECT
    );
    sqlx::query_as::<_, CartLine>(&query)
        .bind(cart_id)
        .fetch_all(conn)
        .await
}

/// Finds a line in any cart; ownership is checked by the caller.
pub async fn find_line(
    conn: &mut PgConnection,
    line_id: CartLineId,
) -> Result<Option<CartLine>, sqlx::Error> {
    let query = format!("{} WHERE l.id = $1", LINE_SELECT);
    sqlx::query_as::<_, CartLine>(&query)
        .bind(line_id)
        .fetch_optional(conn)
        .await
}

pub async fn insert_line(
    conn: &mut PgConnection,
    cart_id: CartId,
    product_id: ProductId,
    quantity: i32,
    unit_price: Decimal,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO cart_lines (id, cart_id, product_id, quantity, unit_price) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(CartLineId::new())
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .bind(unit_price)
    .execute(conn)
    .await?;
    Ok(())
}

/// Sets a line's quantity, refreshing its unit price when one is given.
pub async fn update_line(
    conn: &mut PgConnection,
    line_id: CartLineId,
    quantity: i32,
    unit_price: Option<Decimal>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE cart_lines SET quantity = $2, unit_price = COALESCE($3, unit_price), \
         updated_at = NOW() WHERE id = $1",
    )
    .bind(line_id)
    .bind(quantity)
    .bind(unit_price)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn delete_line(conn: &mut PgConnection, line_id: CartLineId) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM cart_lines WHERE id = $1")
        .bind(line_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn clear_lines(conn: &mut PgConnection, cart_id: CartId) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_lines WHERE cart_id = $1")
        .bind(cart_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn touch(conn: &mut PgConnection, cart_id: CartId) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE carts SET updated_at = NOW() WHERE id = $1")
        .bind(cart_id)
        .execute(conn)
        .await?;
    Ok(())
}
