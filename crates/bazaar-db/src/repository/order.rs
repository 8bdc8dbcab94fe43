//! # Order Repository
//!
//! Orders, placement from a priced cart, admin edits and status updates.
//!
//! ## Order Placement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  place_order (ONE TRANSACTION)                          │
//! │                                                                         │
//! │  1. For each catalog-priced line:                                      │
//! │     UPDATE products SET quantity = quantity - n                        │
//! │     WHERE id = ? AND quantity >= n      ── 0 rows? → InsufficientStock │
//! │                                                                         │
//! │  2. INSERT INTO orders (items JSON, totals, address JSON,              │
//! │                        'confirmed', 'paid')                             │
//! │                                                                         │
//! │  3. DELETE FROM cart WHERE user_id = ?                                 │
//! │                                                                         │
//! │  4. COMMIT  (any failure above rolls everything back)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Snapshot-priced lines (product no longer in the catalog) never touch
//! stock.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use bazaar_core::orders::restocks_on;
use bazaar_core::pricing::PricedCart;
use bazaar_core::{Order, OrderItem, OrderStatus, PaymentStatus, ShippingAddress};

const ORDER_COLUMNS: &str = "id, user_id, items, subtotal, savings, tax, total, \
     shipping_address, status, payment_status, created_at, updated_at";

// =============================================================================
// Row Mapping
// =============================================================================

/// Raw `orders` row; JSON columns still encoded.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    items: String,
    subtotal: f64,
    savings: f64,
    tax: f64,
    total: f64,
    shipping_address: String,
    status: OrderStatus,
    payment_status: PaymentStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DbError;

    fn try_from(row: OrderRow) -> DbResult<Self> {
        Ok(Order {
            id: row.id,
            user_id: row.user_id,
            items: serde_json::from_str(&row.items)?,
            subtotal: row.subtotal,
            savings: row.savings,
            tax: row.tax,
            total: row.total,
            shipping_address: serde_json::from_str(&row.shipping_address)?,
            status: row.status,
            payment_status: row.payment_status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Stock Helpers
// =============================================================================

/// Takes `quantity` units from stock, failing if fewer are available.
async fn take_stock(conn: &mut SqliteConnection, product_id: i64, quantity: i64) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET quantity = quantity - ?1, updated_at = ?2
        WHERE id = ?3 AND quantity >= ?1
        "#,
    )
    .bind(quantity)
    .bind(Utc::now())
    .bind(product_id)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InsufficientStock {
            product_id,
            requested: quantity,
        });
    }
    Ok(())
}

/// Returns units to stock. A product that no longer exists is skipped.
async fn return_stock(conn: &mut SqliteConnection, product_id: i64, quantity: i64) -> DbResult<()> {
    sqlx::query("UPDATE products SET quantity = quantity + ?1, updated_at = ?2 WHERE id = ?3")
        .bind(quantity)
        .bind(Utc::now())
        .bind(product_id)
        .execute(conn)
        .await?;
    Ok(())
}

async fn fetch_row(conn: &mut SqliteConnection, id: i64) -> DbResult<OrderRow> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
    sqlx::query_as::<_, OrderRow>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| DbError::not_found("Order", id))
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for orders.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Order::try_from).transpose()
    }

    /// Every order, newest first.
    pub async fn list_all(&self) -> DbResult<Vec<Order>> {
        debug!("Listing all orders");

        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// One customer's orders, newest first.
    pub async fn list_for_user(&self, user_id: i64) -> DbResult<Vec<Order>> {
        debug!(user_id = user_id, "Listing orders for user");

        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ?1 ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Writes a new order from `cart`, takes stock and clears the cart.
    ///
    /// All in one transaction; see the module docs.
    pub async fn place_order(
        &self,
        user_id: i64,
        cart: &PricedCart,
        shipping: &ShippingAddress,
    ) -> DbResult<Order> {
        debug!(user_id = user_id, lines = cart.lines.len(), "Placing order");

        let items = cart.order_items();
        let items_json = serde_json::to_string(&items)?;
        let address_json = serde_json::to_string(shipping)?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        for line in cart.lines.iter().filter(|l| l.is_catalog_priced()) {
            take_stock(&mut *tx, line.product_id, line.quantity).await?;
        }

        let result = sqlx::query(
            r#"
            INSERT INTO orders (
                user_id, items, subtotal, savings, tax, total,
                shipping_address, status, payment_status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(user_id)
        .bind(&items_json)
        .bind(cart.totals.subtotal.amount())
        .bind(cart.totals.savings.amount())
        .bind(cart.totals.tax.amount())
        .bind(cart.totals.total.amount())
        .bind(&address_json)
        .bind(OrderStatus::Confirmed)
        .bind(PaymentStatus::Paid)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let id = result.last_insert_rowid();

        sqlx::query("DELETE FROM cart WHERE user_id = ?1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(order_id = id, user_id = user_id, total = %cart.totals.total, "Order stored");

        Ok(Order {
            id,
            user_id,
            items,
            subtotal: cart.totals.subtotal.amount(),
            savings: cart.totals.savings.amount(),
            tax: cart.totals.tax.amount(),
            total: cart.totals.total.amount(),
            shipping_address: shipping.clone(),
            status: OrderStatus::Confirmed,
            payment_status: PaymentStatus::Paid,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rewrites an existing order from an admin's cart.
    ///
    /// Items, totals and address are replaced. Owner, status, payment status
    /// and creation time are kept. Stock moves by the difference between
    /// the old and new quantities; the editor's cart is cleared. One
    /// transaction.
    ///
    /// A cancelled order has already returned its stock and is left alone:
    /// the call fails with [`DbError::OrderCancelled`].
    pub async fn replace_order(
        &self,
        order_id: i64,
        editor_id: i64,
        cart: &PricedCart,
        shipping: &ShippingAddress,
    ) -> DbResult<Order> {
        debug!(order_id = order_id, editor_id = editor_id, "Replacing order contents");

        let items = cart.order_items();
        let items_json = serde_json::to_string(&items)?;
        let address_json = serde_json::to_string(shipping)?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;
        let existing = Order::try_from(fetch_row(&mut *tx, order_id).await?)?;
        if existing.is_cancelled() {
            return Err(DbError::OrderCancelled { order_id });
        }

        for (product_id, delta) in stock_deltas(&existing.items, cart) {
            if delta > 0 {
                take_stock(&mut *tx, product_id, delta).await?;
            } else if delta < 0 {
                return_stock(&mut *tx, product_id, -delta).await?;
            }
        }

        sqlx::query(
            r#"
            UPDATE orders
            SET items = ?1, subtotal = ?2, savings = ?3, tax = ?4, total = ?5,
                shipping_address = ?6, updated_at = ?7
            WHERE id = ?8
            "#,
        )
        .bind(&items_json)
        .bind(cart.totals.subtotal.amount())
        .bind(cart.totals.savings.amount())
        .bind(cart.totals.tax.amount())
        .bind(cart.totals.total.amount())
        .bind(&address_json)
        .bind(now)
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM cart WHERE user_id = ?1")
            .bind(editor_id)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(order_id = order_id, "Order contents replaced");

        Ok(Order {
            items,
            subtotal: cart.totals.subtotal.amount(),
            savings: cart.totals.savings.amount(),
            tax: cart.totals.tax.amount(),
            total: cart.totals.total.amount(),
            shipping_address: shipping.clone(),
            updated_at: now,
            ..existing
        })
    }

    /// Writes a new order status, returning stock when the order is
    /// cancelled.
    ///
    /// The transition itself is checked by the caller against
    /// `bazaar_core::orders`.
    pub async fn update_status(&self, id: i64, status: OrderStatus) -> DbResult<Order> {
        debug!(id = id, status = %status, "Updating order status");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut order = Order::try_from(fetch_row(&mut *tx, id).await?)?;

        if restocks_on(order.status, status) {
            for item in &order.items {
                return_stock(&mut *tx, item.product_id, item.quantity).await?;
            }
        }

        sqlx::query("UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(status)
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        order.status = status;
        order.updated_at = now;
        Ok(order)
    }

    /// Writes a new payment status.
    pub async fn update_payment_status(&self, id: i64, status: PaymentStatus) -> DbResult<Order> {
        debug!(id = id, payment_status = %status, "Updating payment status");

        let now = Utc::now();
        let result = sqlx::query("UPDATE orders SET payment_status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(status)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }
}

/// Net stock movement per product when `old` items become `cart`.
///
/// Positive: units to take. Negative: units to return. Only
/// catalog-priced lines count on the new side.
fn stock_deltas(old: &[OrderItem], cart: &PricedCart) -> BTreeMap<i64, i64> {
    let mut deltas = BTreeMap::new();

    for item in old {
        *deltas.entry(item.product_id).or_insert(0) -= item.quantity;
    }
    for line in cart.lines.iter().filter(|l| l.is_catalog_priced()) {
        *deltas.entry(line.product_id).or_insert(0) += line.quantity;
    }

    deltas
}

// =============================================================================
// Unit Tests
// =============================================================================
