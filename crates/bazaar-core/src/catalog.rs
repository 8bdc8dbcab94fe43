//! # Catalog Module
//!
//! Marketplace filtering and admin inventory paging. Pure functions over
//! already-loaded product lists.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use ts_rs::TS;

use crate::types::{Country, Product};

/// Category value meaning "no category filter".
pub const ALL_CATEGORIES: &str = "All";

// =============================================================================
// Marketplace Filter
// =============================================================================

/// Marketplace browse filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    /// `None` or `"All"` matches every category.
    pub category: Option<String>,
    /// Case-insensitive substring of name or description.
    #[serde(default)]
    pub query: String,
    /// Shopper's country; `None` shows every product.
    pub country: Option<Country>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        let category_ok = match self.category.as_deref() {
            None | Some(ALL_CATEGORIES) | Some("") => true,
            Some(category) => product.category == category,
        };

        let query = self.query.trim().to_lowercase();
        let query_ok = query.is_empty()
            || product.name.to_lowercase().contains(&query)
            || product.description.to_lowercase().contains(&query);

        let country_ok = self
            .country
            .map_or(true, |country| product.is_available_in(country));

        category_ok && query_ok && country_ok
    }

    pub fn apply(&self, products: Vec<Product>) -> Vec<Product> {
        products.into_iter().filter(|p| self.matches(p)).collect()
    }
}

/// Distinct categories, sorted, for the category picker.
pub fn categories(products: &[Product]) -> Vec<String> {
    products
        .iter()
        .map(|p| p.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// =============================================================================
// Inventory Listing
// =============================================================================

/// Admin inventory search: case-insensitive match on name or category.
pub fn inventory_search(products: Vec<Product>, term: &str) -> Vec<Product> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return products;
    }

    products
        .into_iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&term) || p.category.to_lowercase().contains(&term)
        })
        .collect()
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based.
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Slices `items` into 1-based pages of `per_page`.
///
/// Page numbers below 1 are treated as 1; a page past the end is empty.
///
/// ## Example
/// ```rust
/// use bazaar_core::catalog::paginate;
///
/// let page = paginate((1..=23).collect::<Vec<_>>(), 3, 10);
/// assert_eq!(page.items, vec![21, 22, 23]);
/// assert_eq!(page.total_pages, 3);
/// ```
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let page = page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page);

    let items = items
        .into_iter()
        .skip((page - 1).saturating_mul(per_page))
        .take(per_page)
        .collect();

    Page {
        items,
        page,
        per_page,
        total_items,
        total_pages,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
