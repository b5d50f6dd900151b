//! Cart and stock engine.
//!
//! Business rules live in the `plan_*` functions, which only look at loaded
//! records and return the writes to perform. [`CartService`] loads the records
//! inside a transaction, asks a planner what to do, applies the result and
//! reloads the cart.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::error::AppError;
use crate::models::cart::{Cart, CartLine};
use crate::models::product::Product;
use crate::models::user::User;
use crate::repositories::transaction::{begin_transaction, commit_transaction};
use crate::repositories::{cart as cart_repo, product as product_repo};
use crate::types::{CartId, CartLineId, ProductId, UserId};

const PRODUCT_UNAVAILABLE: &str = "Product not found or unavailable";

/// A single write against the cart's lines.
#[derive(Debug, Clone, PartialEq)]
pub enum LineChange {
    Insert {
        product_id: ProductId,
        quantity: i32,
        unit_price: Decimal,
    },
    /// `unit_price` is `Some` only when the price snapshot must be refreshed.
    Update {
        line_id: CartLineId,
        quantity: i32,
        unit_price: Option<Decimal>,
    },
    Delete {
        line_id: CartLineId,
    },
}

/// Stock to take out of one product at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDecrement {
    pub product_id: ProductId,
    pub quantity: i32,
}

fn insufficient_stock(available: i32) -> AppError {
    AppError::BadRequest(format!("Insufficient stock. Available: {}", available))
}

/// Decides how adding `quantity` units of `product` changes `cart`.
pub fn plan_add(
    cart: &Cart,
    product: Option<&Product>,
    quantity: i32,
) -> Result<LineChange, AppError> {
    if quantity <= 0 {
        return Err(AppError::BadRequest(
            "Quantity must be greater than zero".to_string(),
        ));
    }

    let product = product
        .filter(|p| p.is_purchasable())
        .ok_or_else(|| AppError::NotFound(PRODUCT_UNAVAILABLE.to_string()))?;

    if !product.has_stock(quantity) {
        return Err(insufficient_stock(product.quantity));
    }

    match cart.line_for_product(product.id) {
        Some(existing) => {
            let merged = existing.quantity.saturating_add(quantity);
            if !product.has_stock(merged) {
                return Err(insufficient_stock(product.quantity - existing.quantity));
            }
            Ok(LineChange::Update {
                line_id: existing.id,
                quantity: merged,
                unit_price: Some(product.price),
            })
        }
        None => Ok(LineChange::Insert {
            product_id: product.id,
            quantity,
            unit_price: product.price,
        }),
    }
}

fn owned_line<'a>(cart: &Cart, line: Option<&'a CartLine>) -> Result<&'a CartLine, AppError> {
    let line = line.ok_or_else(|| AppError::NotFound("Cart item not found".to_string()))?;
    // Ownership is decided by the parent cart, never by the user id.
    if line.cart_id != cart.id {
        return Err(AppError::BadRequest(
            "Item does not belong to your cart".to_string(),
        ));
    }
    Ok(line)
}

pub fn plan_remove(cart: &Cart, line: Option<&CartLine>) -> Result<LineChange, AppError> {
    let line = owned_line(cart, line)?;
    Ok(LineChange::Delete { line_id: line.id })
}

/// Decides how setting a line to `quantity` changes `cart`. Zero or less removes the line.
pub fn plan_update(
    cart: &Cart,
    line: Option<&CartLine>,
    product: Option<&Product>,
    quantity: i32,
) -> Result<LineChange, AppError> {
    if quantity <= 0 {
        return plan_remove(cart, line);
    }

    let line = owned_line(cart, line)?;
    let product = product.ok_or_else(|| AppError::NotFound(PRODUCT_UNAVAILABLE.to_string()))?;
    if !product.has_stock(quantity) {
        return Err(insufficient_stock(product.quantity));
    }

    Ok(LineChange::Update {
        line_id: line.id,
        quantity,
        unit_price: None,
    })
}

/// Verifies every line against current stock and returns the decrements to apply.
///
/// Fails on the first line whose product cannot cover it, before anything is written.
pub fn plan_checkout(cart: &Cart, products: &[Product]) -> Result<Vec<StockDecrement>, AppError> {
    if cart.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".to_string()));
    }

    cart.lines
        .iter()
        .map(|line| {
            let covered = products
                .iter()
                .find(|p| p.id == line.product_id)
                .is_some_and(|p| p.has_stock(line.quantity));
            if !covered {
                return Err(AppError::BadRequest(format!(
                    "Product '{}' has insufficient stock",
                    line.product_name
                )));
            }
            Ok(StockDecrement {
                product_id: line.product_id,
                quantity: line.quantity,
            })
        })
        .collect()
}

#[derive(Clone)]
pub struct CartService {
    pool: PgPool,
}

impl CartService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_or_create(&self, user: &User) -> Result<Cart, AppError> {
        let mut tx = begin_transaction(&self.pool).await?;
        let cart = load_cart(&mut *tx, user.id).await?;
        commit_transaction(tx).await?;
        Ok(cart)
    }

    pub async fn item_count(&self, user: &User) -> Result<i64, AppError> {
        Ok(self.get_or_create(user).await?.item_count())
    }

    pub async fn add_line(
        &self,
        user: &User,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<Cart, AppError> {
        let mut tx = begin_transaction(&self.pool).await?;
        let cart = load_cart(&mut *tx, user.id).await?;
        let product = product_repo::lock_by_id(&mut *tx, product_id).await?;

        let change = plan_add(&cart, product.as_ref(), quantity)?;
        apply(&mut *tx, cart.id, &change).await?;

        let cart = load_cart(&mut *tx, user.id).await?;
        commit_transaction(tx).await?;
        tracing::debug!(user_id = %user.id, product_id = %product_id, quantity, "Cart line added");
        Ok(cart)
    }

    pub async fn remove_line(&self, user: &User, line_id: CartLineId) -> Result<Cart, AppError> {
        let mut tx = begin_transaction(&self.pool).await?;
        let cart = load_cart(&mut *tx, user.id).await?;
        let line = cart_repo::find_line(&mut *tx, line_id).await?;

        let change = plan_remove(&cart, line.as_ref())?;
        apply(&mut *tx, cart.id, &change).await?;

        let cart = load_cart(&mut *tx, user.id).await?;
        commit_transaction(tx).await?;
        tracing::debug!(user_id = %user.id, line_id = %line_id, "Cart line removed");
        Ok(cart)
    }

    pub async fn update_quantity(
        &self,
        user: &User,
        line_id: CartLineId,
        quantity: i32,
    ) -> Result<Cart, AppError> {
        let mut tx = begin_transaction(&self.pool).await?;
        let cart = load_cart(&mut *tx, user.id).await?;
        let line = cart_repo::find_line(&mut *tx, line_id).await?;
        let product = match &line {
            Some(line) if quantity > 0 => product_repo::lock_by_id(&mut *tx, line.product_id).await?,
            _ => None,
        };

        let change = plan_update(&cart, line.as_ref(), product.as_ref(), quantity)?;
        apply(&mut *tx, cart.id, &change).await?;

        let cart = load_cart(&mut *tx, user.id).await?;
        commit_transaction(tx).await?;
        tracing::debug!(user_id = %user.id, line_id = %line_id, quantity, "Cart line updated");
        Ok(cart)
    }

    pub async fn clear(&self, user: &User) -> Result<Cart, AppError> {
        let mut tx = begin_transaction(&self.pool).await?;
        let cart = load_cart(&mut *tx, user.id).await?;
        cart_repo::clear_lines(&mut *tx, cart.id).await?;
        cart_repo::touch(&mut *tx, cart.id).await?;

        let cart = load_cart(&mut *tx, user.id).await?;
        commit_transaction(tx).await?;
        Ok(cart)
    }

    /// Takes every line's quantity out of stock and empties the cart.
    ///
    /// Product rows stay locked from verification until commit, so two
    /// checkouts of the same product run one after the other.
    pub async fn checkout(&self, user: &User) -> Result<Cart, AppError> {
        let mut tx = begin_transaction(&self.pool).await?;
        let cart = load_cart(&mut *tx, user.id).await?;

        let mut product_ids: Vec<ProductId> =
            cart.lines.iter().map(|line| line.product_id).collect();
        product_ids.sort();
        product_ids.dedup();
        let products = product_repo::lock_many(&mut *tx, &product_ids).await?;

        let decrements = plan_checkout(&cart, &products)?;
        for decrement in &decrements {
            let applied =
                product_repo::decrement_stock(&mut *tx, decrement.product_id, decrement.quantity)
                    .await?;
            if !applied {
                let name = cart
                    .line_for_product(decrement.product_id)
                    .map(|line| line.product_name.as_str())
                    .unwrap_or_default();
                return Err(AppError::BadRequest(format!(
                    "Product '{}' has insufficient stock",
                    name
                )));
            }
        }

        cart_repo::clear_lines(&mut *tx, cart.id).await?;
        cart_repo::touch(&mut *tx, cart.id).await?;
        let emptied = load_cart(&mut *tx, user.id).await?;
        commit_transaction(tx).await?;

        tracing::info!(
            user_id = %user.id,
            lines = decrements.len(),
            total = %cart.total(),
            "Checkout completed"
        );
        Ok(emptied)
    }
}

async fn load_cart(conn: &mut PgConnection, user_id: UserId) -> Result<Cart, AppError> {
    let row = cart_repo::get_or_create_locked(&mut *conn, user_id).await?;
    let lines = cart_repo::load_lines(conn, row.id).await?;
    Ok(Cart::from_parts(row, lines))
}

async fn apply(conn: &mut PgConnection, cart_id: CartId, change: &LineChange) -> Result<(), AppError> {
    match change {
        LineChange::Insert {
            product_id,
            quantity,
            unit_price,
        } => cart_repo::insert_line(&mut *conn, cart_id, *product_id, *quantity, *unit_price).await?,
        LineChange::Update {
            line_id,
            quantity,
            unit_price,
        } => cart_repo::update_line(&mut *conn, *line_id, *quantity, *unit_price).await?,
        LineChange::Delete { line_id } => cart_repo::delete_line(&mut *conn, *line_id).await?,
    }
    cart_repo::touch(conn, cart_id).await?;
    Ok(())
}
