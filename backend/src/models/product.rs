//! Catalog products as consumed by the cart engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::types::{ProductId, StoreId};

/// A product joined with the active flag of the store that owns it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Product {
    #[schema(value_type = String)]
    pub id: ProductId,
    #[schema(value_type = String)]
    pub store_id: StoreId,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String)]
    pub price: Decimal,
    /// Units currently in stock.
    pub quantity: i32,
    pub total_sold: i32,
    pub is_active: bool,
    pub store_active: bool,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// A product can be sold only while both it and its store are active.
    pub fn is_purchasable(&self) -> bool {
        self.is_active && self.store_active
    }

    pub fn has_stock(&self, requested: i32) -> bool {
        self.quantity >= requested
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::product;
    use rust_decimal::Decimal;

    #[test]
    fn purchasable_requires_product_and_store_active() {
        let mut p = product(Decimal::new(1000, 2), 5);
        assert!(p.is_purchasable());

        p.store_active = false;
        assert!(!p.is_purchasable());

        p.store_active = true;
        p.is_active = false;
        assert!(!p.is_purchasable());
    }

    #[test]
    fn has_stock_is_inclusive() {
        let p = product(Decimal::new(1000, 2), 5);
        assert!(p.has_stock(5));
        assert!(!p.has_stock(6));
    }
}
