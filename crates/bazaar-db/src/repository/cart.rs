//! # Cart Repository
//!
//! Per-unit cart entries.
//!
//! ## One Row Per Unit
//! ```text
//! add 3 × Lamp  ──►  cart
//!                    ┌────┬──────┬─────────┬───────┬────────────┐
//!                    │ id │ user │ product │ name  │ unit_price │
//!                    ├────┼──────┼─────────┼───────┼────────────┤
//!                    │ 11 │  2   │    7    │ Lamp  │   500.0    │
//!                    │ 12 │  2   │    7    │ Lamp  │   500.0    │
//!                    │ 13 │  2   │    7    │ Lamp  │   500.0    │
//!                    └────┴──────┴─────────┴───────┴────────────┘
//! ```
//! Lines and quantities are derived by `bazaar_core::pricing::aggregate_cart`.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use bazaar_core::{CartEntry, OrderItem, Product};

const CART_COLUMNS: &str =
    "id, user_id, product_id, name, unit_price, discount_percentage, image, added_at";

/// Repository for cart entries.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Adds `count` units of `product`, one row each, in one transaction.
    ///
    /// Name, price, discount and image are snapshotted from `product`.
    pub async fn add_units(&self, user_id: i64, product: &Product, count: i64) -> DbResult<Vec<i64>> {
        debug!(user_id = user_id, product_id = product.id, count = count, "Adding cart units");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(count.max(0) as usize);

        for _ in 0..count {
            let result = sqlx::query(
                r#"
                INSERT INTO cart
                    (user_id, product_id, name, unit_price, discount_percentage, image, added_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(user_id)
            .bind(product.id)
            .bind(&product.name)
            .bind(product.price)
            .bind(product.discount_percentage)
            .bind(&product.image)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            ids.push(result.last_insert_rowid());
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(ids)
    }

    /// Replaces the user's cart with the units of `items`.
    ///
    /// Used when an admin starts editing an order: the order's lines become
    /// the admin's cart, carrying their frozen price and discount.
    pub async fn load_items(&self, user_id: i64, items: &[OrderItem]) -> DbResult<()> {
        debug!(user_id = user_id, lines = items.len(), "Loading items into cart");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM cart WHERE user_id = ?1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for item in items {
            for _ in 0..item.quantity {
                sqlx::query(
                    r#"
                    INSERT INTO cart
                        (user_id, product_id, name, unit_price, discount_percentage, image, added_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6)
                    "#,
                )
                .bind(user_id)
                .bind(item.product_id)
                .bind(&item.name)
                .bind(item.price)
                .bind(item.discount_percentage)
                .bind(now)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// The user's entries in insertion order.
    pub async fn list_for_user(&self, user_id: i64) -> DbResult<Vec<CartEntry>> {
        let sql = format!("SELECT {CART_COLUMNS} FROM cart WHERE user_id = ?1 ORDER BY id");
        let entries = sqlx::query_as::<_, CartEntry>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(user_id = user_id, count = entries.len(), "Loaded cart entries");
        Ok(entries)
    }

    /// Cart badge count: number of entries.
    pub async fn count_for_user(&self, user_id: i64) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Deletes every entry of one product from the user's cart.
    ///
    /// Returns the number of entries removed.
    pub async fn remove_product(&self, user_id: i64, product_id: i64) -> DbResult<u64> {
        debug!(user_id = user_id, product_id = product_id, "Removing product from cart");

        let result = sqlx::query("DELETE FROM cart WHERE user_id = ?1 AND product_id = ?2")
            .bind(user_id)
            .bind(product_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Empties the user's cart.
    pub async fn clear(&self, user_id: i64) -> DbResult<u64> {
        debug!(user_id = user_id, "Clearing cart");

        let result = sqlx::query("DELETE FROM cart WHERE user_id = ?1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use bazaar_core::{Country, NewUser, ProductDraft, UserRole};

    struct Fixture {
        db: Database,
        user_id: i64,
        lamp: Product,
        rug: Product,
    }

    async fn setup() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let user = db
            .users()
            .create(
                &NewUser {
                    name: "Cart Owner".to_string(),
                    email: "cart@example.com".to_string(),
                    phone: "9000000000".to_string(),
                    age: 30,
                    password: "Secur3!pass".to_string(),
                    country: "India".to_string(),
                },
                Country::India,
                UserRole::Customer,
            )
            .await
            .unwrap();

        let draft = |name: &str, price: f64| ProductDraft {
            owner_id: None,
            name: name.to_string(),
            description: "Demo catalog item".to_string(),
            price,
            discount_percentage: 0.0,
            quantity: 10,
            category: "Home".to_string(),
            country: Country::India,
            image: None,
        };
        let ids = db
            .products()
            .insert_many(&[draft("Lamp", 500.0), draft("Rug", 1200.0)])
            .await
            .unwrap();

        let products = db.products();
        let lamp = products.get_by_id(ids[0]).await.unwrap().unwrap();
        let rug = products.get_by_id(ids[1]).await.unwrap().unwrap();

        Fixture {
            db,
            user_id: user.id,
            lamp,
            rug,
        }
    }

    #[tokio::test]
    async fn test_add_units_inserts_one_row_each() {
        let f = setup().await;
        let cart = f.db.cart();

        let ids = cart.add_units(f.user_id, &f.lamp, 3).await.unwrap();
        assert_eq!(ids.len(), 3);

        let entries = cart.list_for_user(f.user_id).await.unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.product_id == f.lamp.id));
        assert_eq!(entries[0].unit_price, 500.0);
        assert_eq!(entries[0].discount_percentage, 0.0);
        assert_eq!(entries[0].name, "Lamp");
        assert_eq!(cart.count_for_user(f.user_id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_remove_product_and_clear() {
        let f = setup().await;
        let cart = f.db.cart();
        cart.add_units(f.user_id, &f.lamp, 2).await.unwrap();
        cart.add_units(f.user_id, &f.rug, 1).await.unwrap();

        assert_eq!(cart.remove_product(f.user_id, f.lamp.id).await.unwrap(), 2);
        let left = cart.list_for_user(f.user_id).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].product_id, f.rug.id);

        assert_eq!(cart.clear(f.user_id).await.unwrap(), 1);
        assert!(cart.list_for_user(f.user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_items_replaces_cart() {
        let f = setup().await;
        let cart = f.db.cart();
        cart.add_units(f.user_id, &f.rug, 4).await.unwrap();

        let items = vec![OrderItem {
            product_id: f.lamp.id,
            name: "Lamp".to_string(),
            price: 500.0,
            discount_percentage: 10.0,
            quantity: 2,
        }];
        cart.load_items(f.user_id, &items).await.unwrap();

        let entries = cart.list_for_user(f.user_id).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.product_id == f.lamp.id));
        assert!(entries.iter().all(|e| e.discount_percentage == 10.0));
    }

    #[tokio::test]
    async fn test_entries_deleted_with_user() {
        let f = setup().await;
        f.db.cart().add_units(f.user_id, &f.lamp, 2).await.unwrap();

        f.db.users().delete(f.user_id).await.unwrap();
        assert_eq!(f.db.cart().count_for_user(f.user_id).await.unwrap(), 0);
    }
}
