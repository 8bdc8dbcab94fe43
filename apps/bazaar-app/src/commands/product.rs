//! # Product Commands
//!
//! Marketplace browsing and admin inventory management.
//!
//! ## Inventory Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Admin "Add Products" page                                              │
//! │                                                                         │
//! │  form ──► queue ──► form ──► queue ──► add_products([..])              │
//! │                                            │                            │
//! │                                            ▼                            │
//! │                          validate every form (first failure wins)      │
//! │                                            │                            │
//! │                                            ▼                            │
//! │                          insert_many: one transaction, all or none     │
//! │                                                                         │
//! │  Inventory table ── inventory_page(search, page) ── set_stock/update/  │
//! │                                                    delete per row      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::state::{ConfigState, DbState, Session};
use bazaar_core::catalog::{categories, inventory_search, paginate, Page, ProductFilter};
use bazaar_core::validation::{
    validate_new_product, validate_product_patch, validate_search_query, validate_stock_quantity,
};
use bazaar_core::{NewProduct, Product, ProductPatch};

/// A product as shown on a marketplace card.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCard {
    #[serde(flatten)]
    pub product: Product,
    /// Price after discount, unrounded.
    pub effective_price: f64,
    pub in_stock: bool,
}

impl From<Product> for ProductCard {
    fn from(product: Product) -> Self {
        ProductCard {
            effective_price: product.effective_price().amount(),
            in_stock: product.quantity > 0,
            product,
        }
    }
}

async fn load_catalog(db: &DbState) -> ApiResult<Vec<Product>> {
    db.inner()
        .products()
        .list()
        .await
        .map_err(|e| ApiError::storage("Failed to load products", e))
}

/// Marketplace listing.
///
/// Customers only see products offered in their own country; the
/// `country` of the incoming filter is ignored for them.
pub async fn browse_products(
    db: &DbState,
    session: &Session,
    filter: ProductFilter,
) -> ApiResult<Vec<ProductCard>> {
    debug!(category = ?filter.category, query = %filter.query, "browse_products command");

    let filter = ProductFilter {
        query: validate_search_query(&filter.query)?,
        country: if session.is_admin() {
            filter.country
        } else {
            Some(session.user().country)
        },
        ..filter
    };

    let products = load_catalog(db).await?;
    Ok(filter.apply(products).into_iter().map(ProductCard::from).collect())
}

/// Distinct categories for the category picker.
pub async fn list_categories(db: &DbState) -> ApiResult<Vec<String>> {
    debug!("list_categories command");

    let products = load_catalog(db).await?;
    Ok(categories(&products))
}

/// Gets a single product by ID.
///
/// A customer asking for another country's product gets not found.
pub async fn get_product(db: &DbState, session: &Session, id: i64) -> ApiResult<ProductCard> {
    debug!(id = id, "get_product command");

    let product = db
        .inner()
        .products()
        .get_by_id(id)
        .await
        .map_err(|e| ApiError::storage("Failed to load product", e))?
        .filter(|p| session.can_see(p))
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    Ok(ProductCard::from(product))
}

/// Admin inventory table: search by name or category, then page.
pub async fn inventory_page(
    db: &DbState,
    config: &ConfigState,
    session: &Session,
    search: &str,
    page: usize,
) -> ApiResult<Page<Product>> {
    debug!(search = %search, page = page, "inventory_page command");
    session.require_admin()?;

    let search = validate_search_query(search)?;
    let products = load_catalog(db).await?;

    Ok(paginate(inventory_search(products, &search), page, config.page_size))
}

/// Writes a queued batch of new products.
///
/// Every form is validated before anything is written; the batch is then
/// stored in one transaction. Returns the new product IDs.
pub async fn add_products(
    db: &DbState,
    session: &Session,
    forms: Vec<NewProduct>,
) -> ApiResult<Vec<i64>> {
    debug!(count = forms.len(), "add_products command");
    session.require_admin()?;

    if forms.is_empty() {
        return Err(ApiError::validation("Add at least one product first"));
    }

    let drafts = forms
        .iter()
        .enumerate()
        .map(|(index, form)| {
            validate_new_product(form, Some(session.user_id()))
                .map_err(|e| ApiError::validation(format!("Product {}: {}", index + 1, e)))
        })
        .collect::<ApiResult<Vec<_>>>()?;

    let ids = db
        .inner()
        .products()
        .insert_many(&drafts)
        .await
        .map_err(|e| ApiError::storage("Failed to add product", e))?;

    info!(count = ids.len(), owner_id = session.user_id(), "Products added");
    Ok(ids)
}

/// Admin edit of one product.
pub async fn update_product(
    db: &DbState,
    session: &Session,
    id: i64,
    patch: ProductPatch,
) -> ApiResult<Product> {
    debug!(id = id, "update_product command");
    session.require_admin()?;

    validate_product_patch(&patch)?;

    let product = db
        .inner()
        .products()
        .update(id, &patch)
        .await
        .map_err(|e| ApiError::storage("Failed to update product", e))?;

    info!(id = id, "Product updated");
    Ok(product)
}

/// Quick stock adjustment from the inventory table.
pub async fn set_stock(db: &DbState, session: &Session, id: i64, quantity: i64) -> ApiResult<()> {
    debug!(id = id, quantity = quantity, "set_stock command");
    session.require_admin()?;

    validate_stock_quantity(quantity)?;

    db.inner()
        .products()
        .set_quantity(id, quantity)
        .await
        .map_err(|e| ApiError::storage("Failed to update stock", e))?;

    info!(id = id, quantity = quantity, "Stock updated");
    Ok(())
}

/// Removes a product from the catalog.
pub async fn delete_product(db: &DbState, session: &Session, id: i64) -> ApiResult<()> {
    debug!(id = id, "delete_product command");
    session.require_admin()?;

    db.inner()
        .products()
        .delete(id)
        .await
        .map_err(|e| ApiError::storage("Failed to delete product", e))?;

    info!(id = id, "Product deleted");
    Ok(())
}

/// Products created by the session's user.
pub async fn list_own_products(db: &DbState, session: &Session) -> ApiResult<Vec<Product>> {
    debug!(owner_id = session.user_id(), "list_own_products command");

    db.inner()
        .products()
        .list_by_owner(session.user_id())
        .await
        .map_err(|e| ApiError::storage("Failed to load products", e))
}
