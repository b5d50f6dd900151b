//! Shopping carts and their lines. Totals are always derived from the lines.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::types::{CartId, CartLineId, ProductId, UserId};

/// Bare `carts` row.
#[derive(Debug, Clone, FromRow)]
pub struct CartRow {
    pub id: CartId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One product entry in a cart, carrying the product's display data.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CartLine {
    pub id: CartLineId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_photo_url: Option<String>,
    /// Always at least 1.
    pub quantity: i32,
    /// Price captured when the line was created or last merged.
    pub unit_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartLine {
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub lines: Vec<CartLine>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn from_parts(row: CartRow, lines: Vec<CartLine>) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            lines,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|line| i64::from(line.quantity)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line_for_product(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id == product_id)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCartItemRequest {
    #[schema(value_type = String)]
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct QuantityQuery {
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineResponse {
    #[schema(value_type = String)]
    pub id: CartLineId,
    #[schema(value_type = String)]
    pub product_id: ProductId,
    pub product_name: String,
    pub product_photo_url: Option<String>,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub unit_price: Decimal,
    #[schema(value_type = String)]
    pub subtotal: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    #[schema(value_type = String)]
    pub id: CartId,
    pub items: Vec<CartLineResponse>,
    #[schema(value_type = String)]
    pub total: Decimal,
    pub item_count: i64,
    pub is_empty: bool,
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        let total = cart.total();
        let item_count = cart.item_count();
        let is_empty = cart.is_empty();
        let items = cart
            .lines
            .into_iter()
            .map(|line| CartLineResponse {
                subtotal: line.subtotal(),
                id: line.id,
                product_id: line.product_id,
                product_name: line.product_name,
                product_photo_url: line.product_photo_url,
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect();
        CartResponse {
            id: cart.id,
            items,
            total,
            item_count,
            is_empty,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartCountResponse {
    pub count: i64,
}
