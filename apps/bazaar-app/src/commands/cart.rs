//! # Cart Commands
//!
//! The cart lives in the store, one row per unit; every response carries
//! the aggregated lines and freshly computed totals.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│ Checkout │────►│  Order   │       │
//! │  │  Cart    │     │          │     │  (2 steps│     │  placed  │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │                        │                                 │              │
//! │                   add_to_cart                    cart cleared in the    │
//! │                   remove_from_cart               same transaction       │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                   clear_cart ──────────────────────►                   │
//! │                                                      (back to empty)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::state::{ConfigState, DbState, Session};
use bazaar_core::pricing::{CartLine, CartTotals, PricedCart};
use bazaar_core::validation::validate_add_quantity;
use bazaar_core::CoreError;
use bazaar_db::DbResult;

/// Cart response including aggregated lines and totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
    /// Cart badge: number of stored entries.
    pub entry_count: usize,
    /// Set while an admin is editing an existing order.
    pub editing_order: Option<i64>,
}

impl CartResponse {
    pub(crate) fn new(cart: PricedCart, session: &Session) -> Self {
        CartResponse {
            entry_count: cart.lines.iter().map(|l| l.entry_ids.len()).sum(),
            lines: cart.lines,
            totals: cart.totals,
            editing_order: session.editing_order(),
        }
    }
}

/// Loads the user's entries and the products they reference, then prices
/// them.
pub(crate) async fn load_priced_cart(
    db: &DbState,
    config: &ConfigState,
    user_id: i64,
) -> DbResult<PricedCart> {
    let entries = db.inner().cart().list_for_user(user_id).await?;

    let mut ids: Vec<i64> = entries.iter().map(|e| e.product_id).collect();
    ids.sort_unstable();
    ids.dedup();
    let products = db.inner().products().get_many(&ids).await?;

    Ok(PricedCart::build(&entries, &products, config.tax_rate()))
}

pub(crate) async fn cart_response(
    db: &DbState,
    config: &ConfigState,
    session: &Session,
) -> ApiResult<CartResponse> {
    let cart = load_priced_cart(db, config, session.user_id())
        .await
        .map_err(|e| ApiError::storage("Failed to load cart", e))?;

    Ok(CartResponse::new(cart, session))
}

/// Gets the current cart contents.
pub async fn view_cart(
    db: &DbState,
    config: &ConfigState,
    session: &Session,
) -> ApiResult<CartResponse> {
    debug!(user_id = session.user_id(), "view_cart command");
    cart_response(db, config, session).await
}

/// Adds `quantity` units (default 1) of a product.
///
/// ## Behavior
/// - 1 to 999 units per call
/// - Customers can only add products offered in their country
/// - Units already in the cart count against current stock
/// - Name, price, discount and image are snapshotted on each new entry
pub async fn add_to_cart(
    db: &DbState,
    config: &ConfigState,
    session: &Session,
    product_id: i64,
    quantity: Option<i64>,
) -> ApiResult<CartResponse> {
    let quantity = quantity.unwrap_or(1);
    debug!(product_id = product_id, quantity = quantity, "add_to_cart command");

    validate_add_quantity(quantity)?;

    let product = db
        .inner()
        .products()
        .get_by_id(product_id)
        .await
        .map_err(|e| ApiError::storage("Failed to add item to cart", e))?
        .filter(|p| session.can_see(p))
        .ok_or(CoreError::ProductNotFound(product_id))?;

    // An order being edited already holds its units; the stock check for
    // those runs when the edit is saved.
    if session.editing_order().is_none() {
        let in_cart = db
            .inner()
            .cart()
            .list_for_user(session.user_id())
            .await
            .map_err(|e| ApiError::storage("Failed to add item to cart", e))?
            .iter()
            .filter(|e| e.product_id == product_id)
            .count() as i64;

        if !product.can_sell(in_cart + quantity) {
            return Err(CoreError::InsufficientStock {
                name: product.name.clone(),
                available: product.quantity,
                requested: in_cart + quantity,
            }
            .into());
        }
    }

    db.inner()
        .cart()
        .add_units(session.user_id(), &product, quantity)
        .await
        .map_err(|e| ApiError::storage("Failed to add item to cart", e))?;

    info!(
        user_id = session.user_id(),
        product_id = product_id,
        quantity = quantity,
        "Added to cart"
    );
    cart_response(db, config, session).await
}

/// Removes every unit of one product.
pub async fn remove_from_cart(
    db: &DbState,
    config: &ConfigState,
    session: &Session,
    product_id: i64,
) -> ApiResult<CartResponse> {
    debug!(product_id = product_id, "remove_from_cart command");

    let removed = db
        .inner()
        .cart()
        .remove_product(session.user_id(), product_id)
        .await
        .map_err(|e| ApiError::storage("Failed to remove item from cart", e))?;

    if removed == 0 {
        return Err(ApiError::cart("Item is not in your cart"));
    }

    cart_response(db, config, session).await
}

/// Clears all items from the cart.
pub async fn clear_cart(
    db: &DbState,
    config: &ConfigState,
    session: &Session,
) -> ApiResult<CartResponse> {
    debug!(user_id = session.user_id(), "clear_cart command");

    db.inner()
        .cart()
        .clear(session.user_id())
        .await
        .map_err(|e| ApiError::storage("Failed to clear cart", e))?;

    cart_response(db, config, session).await
}

/// Cart badge count: number of stored entries.
pub async fn cart_count(db: &DbState, session: &Session) -> ApiResult<i64> {
    db.inner()
        .cart()
        .count_for_user(session.user_id())
        .await
        .map_err(|e| ApiError::storage("Failed to load cart", e))
}
