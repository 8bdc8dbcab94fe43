//! # Product Repository
//!
//! Catalog reads, admin edits and stock updates.
//!
//! ## Key Operations
//! - Bulk insert of a queued batch in one transaction
//! - Partial edits (`ProductPatch`) and quick stock adjustment
//! - Batch lookup by id for cart aggregation
//!
//! Filtering for the marketplace and inventory search runs in
//! `bazaar_core::catalog` over the loaded list; the demo catalog is small.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use bazaar_core::{Product, ProductDraft, ProductPatch};

const PRODUCT_COLUMNS: &str = "id, owner_id, name, description, price, discount_percentage, \
     quantity, category, country, image, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let all = repo.list().await?;
/// let product = repo.get_by_id(7).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Every product, newest first.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        debug!("Listing products");

        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id DESC");
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Products listed by one user, newest first.
    pub async fn list_by_owner(&self, owner_id: i64) -> DbResult<Vec<Product>> {
        debug!(owner_id = owner_id, "Listing products by owner");

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE owner_id = ?1 ORDER BY id DESC"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Fetches the products among `ids` that still exist.
    pub async fn get_many(&self, ids: &[i64]) -> DbResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = ids.len(), "Fetching products by id");

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id IN ("
        ));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let products = builder
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Writes a queued batch of products in one transaction.
    ///
    /// Either every draft is stored or none is. Returns the new ids in
    /// input order.
    pub async fn insert_many(&self, drafts: &[ProductDraft]) -> DbResult<Vec<i64>> {
        debug!(count = drafts.len(), "Inserting products");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(drafts.len());

        for draft in drafts {
            let result = sqlx::query(
                r#"
                INSERT INTO products (
                    owner_id, name, description, price, discount_percentage,
                    quantity, category, country, image, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
            )
            .bind(draft.owner_id)
            .bind(&draft.name)
            .bind(&draft.description)
            .bind(draft.price)
            .bind(draft.discount_percentage)
            .bind(draft.quantity)
            .bind(&draft.category)
            .bind(draft.country)
            .bind(&draft.image)
            .bind(now)
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

    /// Applies an admin edit and returns the updated product.
    pub async fn update(&self, id: i64, patch: &ProductPatch) -> DbResult<Product> {
        debug!(id = id, "Updating product");

        let mut product = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        if let Some(name) = &patch.name {
            product.name = name.trim().to_string();
        }
        if let Some(description) = &patch.description {
            product.description = description.trim().to_string();
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(discount) = patch.discount_percentage {
            product.discount_percentage = discount;
        }
        if let Some(quantity) = patch.quantity {
            product.quantity = quantity;
        }
        if let Some(category) = &patch.category {
            product.category = category.trim().to_string();
        }
        if let Some(image) = &patch.image {
            product.image = Some(image.clone()).filter(|i| !i.trim().is_empty());
        }
        product.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE products
            SET name = ?1, description = ?2, price = ?3, discount_percentage = ?4,
                quantity = ?5, category = ?6, image = ?7, updated_at = ?8
            WHERE id = ?9
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.discount_percentage)
        .bind(product.quantity)
        .bind(&product.category)
        .bind(&product.image)
        .bind(product.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Quick stock adjustment from the inventory table.
    pub async fn set_quantity(&self, id: i64, quantity: i64) -> DbResult<()> {
        debug!(id = id, quantity = quantity, "Setting product quantity");

        let result = sqlx::query("UPDATE products SET quantity = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(quantity)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    /// Deletes a product. Cart entries pointing at it fall back to their
    /// snapshot price and discount.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id = id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use bazaar_core::Country;

    fn draft(name: &str, price: f64, discount: f64, quantity: i64) -> ProductDraft {
        ProductDraft {
            owner_id: None,
            name: name.to_string(),
            description: format!("{name} from the demo catalog"),
            price,
            discount_percentage: discount,
            quantity,
            category: "Home".to_string(),
            country: Country::India,
            image: None,
        }
    }

    async fn setup() -> ProductRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().products()
    }

    #[tokio::test]
    async fn test_insert_many_and_list() {
        let repo = setup().await;
        let ids = repo
            .insert_many(&[draft("Lamp", 500.0, 10.0, 5), draft("Rug", 1200.0, 0.0, 2)])
            .await
            .unwrap();

        assert_eq!(ids.len(), 2);
        assert_eq!(repo.count().await.unwrap(), 2);

        let lamp = repo.get_by_id(ids[0]).await.unwrap().unwrap();
        assert_eq!(lamp.name, "Lamp");
        assert_eq!(lamp.discount_percentage, 10.0);
        assert_eq!(lamp.country, Country::India);

        // Newest first.
        let listed = repo.list().await.unwrap();
        assert_eq!(listed[0].id, ids[1]);
    }

    #[tokio::test]
    async fn test_bulk_insert_is_all_or_nothing() {
        let repo = setup().await;
        // Discount above 90 violates the CHECK constraint.
        let result = repo
            .insert_many(&[draft("Lamp", 500.0, 10.0, 5), draft("Rug", 1200.0, 95.0, 2)])
            .await;

        assert!(result.is_err());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_many_skips_missing() {
        let repo = setup().await;
        let ids = repo
            .insert_many(&[draft("Lamp", 500.0, 10.0, 5), draft("Rug", 1200.0, 0.0, 2)])
            .await
            .unwrap();

        let found = repo.get_many(&[ids[0], 999, ids[1]]).await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(repo.get_many(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_patch_and_quantity() {
        let repo = setup().await;
        let id = repo.insert_many(&[draft("Lamp", 500.0, 10.0, 5)]).await.unwrap()[0];

        let patch = ProductPatch {
            price: Some(450.0),
            image: Some("https://img.example/lamp.png".to_string()),
            ..Default::default()
        };
        let updated = repo.update(id, &patch).await.unwrap();
        assert_eq!(updated.price, 450.0);
        assert_eq!(updated.name, "Lamp");
        assert!(updated.image.is_some());

        repo.set_quantity(id, 42).await.unwrap();
        assert_eq!(repo.get_by_id(id).await.unwrap().unwrap().quantity, 42);

        assert!(repo.set_quantity(999, 1).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup().await;
        let id = repo.insert_many(&[draft("Lamp", 500.0, 10.0, 5)]).await.unwrap()[0];

        repo.delete(id).await.unwrap();
        assert!(repo.get_by_id(id).await.unwrap().is_none());
        assert!(repo.delete(id).await.is_err());
    }
}
