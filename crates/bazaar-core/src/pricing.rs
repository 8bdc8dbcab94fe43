//! # Pricing Aggregator
//!
//! Groups raw cart entries into lines and computes the cart totals.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CartEntry rows (one per unit)          Product records                 │
//! │  ┌────┬─────────┐                       ┌────┬───────┬────────┐         │
//! │  │ id │ product │                       │ id │ price │ disc % │         │
//! │  ├────┼─────────┤                       ├────┼───────┼────────┤         │
//! │  │ 11 │   7     │                       │  7 │  500  │   10   │         │
//! │  │ 12 │   7     │                       └────┴───────┴────────┘         │
//! │  └────┴─────────┘                                                       │
//! │         │                                     │                         │
//! │         └───────────── aggregate_cart ────────┘                         │
//! │                              │                                          │
//! │                              ▼                                          │
//! │           CartLine { product 7, qty 2, 500 @ 10%, Catalog }             │
//! │                              │                                          │
//! │                              ▼ price_lines                              │
//! │           subtotal 900 • savings 100 • tax 90 • total 990               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stale Entries
//! A cart entry whose product no longer exists is priced from the unit
//! price and discount snapshotted when it was written, and tagged
//! [`PriceSource::Snapshot`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::money::{Money, TaxRate};
use crate::types::{CartEntry, OrderItem, Product};

// =============================================================================
// Cart Line
// =============================================================================

/// Where a line's price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    /// Current product record.
    Catalog,
    /// Entry snapshot; the product is gone from the catalog.
    Snapshot,
}

/// One aggregated cart line: all entries of a single product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: i64,
    pub name: String,
    pub image: Option<String>,
    /// Number of entries sharing `product_id`.
    pub quantity: i64,
    pub discount_percentage: f64,
    /// Unit price before discount.
    pub original_price: f64,
    pub price_source: PriceSource,
    /// Entry ids folded into this line.
    pub entry_ids: Vec<i64>,
}

impl CartLine {
    /// `original_price × (1 − discount/100)`
    pub fn effective_unit_price(&self) -> Money {
        Money::from_amount(self.original_price).apply_percentage_discount(self.discount_percentage)
    }

    pub fn line_subtotal(&self) -> Money {
        self.effective_unit_price() * self.quantity
    }

    /// Zero when the line carries no discount.
    pub fn line_savings(&self) -> Money {
        if self.discount_percentage == 0.0 {
            return Money::zero();
        }
        Money::from_amount(self.original_price).percentage_of(self.discount_percentage)
            * self.quantity
    }

    pub fn is_catalog_priced(&self) -> bool {
        self.price_source == PriceSource::Catalog
    }

    /// Freezes the line into an order item.
    pub fn to_order_item(&self) -> OrderItem {
        OrderItem {
            product_id: self.product_id,
            name: self.name.clone(),
            price: self.original_price,
            discount_percentage: self.discount_percentage,
            quantity: self.quantity,
        }
    }
}

/// Groups a user's cart entries by product.
///
/// Lines come back in the order their product first appears in `entries`.
/// Product metadata (name, price, discount, image) is taken from `products`
/// when present; otherwise the line falls back to the first entry's
/// snapshot price and discount.
///
/// ## Example
/// ```rust
/// use bazaar_core::pricing::{aggregate_cart, PriceSource};
/// # use bazaar_core::types::CartEntry;
/// # use chrono::Utc;
/// # let entry = |id| CartEntry {
/// #     id, user_id: 1, product_id: 9, name: "Mug".into(),
/// #     unit_price: 120.0, discount_percentage: 0.0, image: None,
/// #     added_at: Utc::now(),
/// # };
///
/// let lines = aggregate_cart(&[entry(1), entry(2), entry(3)], &[]);
/// assert_eq!(lines.len(), 1);
/// assert_eq!(lines[0].quantity, 3);
/// assert_eq!(lines[0].price_source, PriceSource::Snapshot);
/// ```
pub fn aggregate_cart(entries: &[CartEntry], products: &[Product]) -> Vec<CartLine> {
    let catalog: HashMap<i64, &Product> = products.iter().map(|p| (p.id, p)).collect();

    let mut lines: Vec<CartLine> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();

    for entry in entries {
        if let Some(&pos) = index.get(&entry.product_id) {
            let line = &mut lines[pos];
            line.quantity += 1;
            line.entry_ids.push(entry.id);
            continue;
        }

        let line = match catalog.get(&entry.product_id) {
            Some(product) => CartLine {
                product_id: entry.product_id,
                name: product.name.clone(),
                image: product.image.clone().or_else(|| entry.image.clone()),
                quantity: 1,
                discount_percentage: product.discount_percentage,
                original_price: product.price,
                price_source: PriceSource::Catalog,
                entry_ids: vec![entry.id],
            },
            None => CartLine {
                product_id: entry.product_id,
                name: entry.name.clone(),
                image: entry.image.clone(),
                quantity: 1,
                discount_percentage: entry.discount_percentage,
                original_price: entry.unit_price,
                price_source: PriceSource::Snapshot,
                entry_ids: vec![entry.id],
            },
        };

        index.insert(entry.product_id, lines.len());
        lines.push(line);
    }

    lines
}

// =============================================================================
// Totals
// =============================================================================

/// Cart-level figures, unrounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    /// Distinct products.
    pub line_count: usize,
    /// Units across all lines (the cart badge).
    pub total_quantity: i64,
    pub subtotal: Money,
    pub savings: Money,
    pub tax: Money,
    pub total: Money,
}

impl CartTotals {
    pub fn empty() -> Self {
        CartTotals {
            line_count: 0,
            total_quantity: 0,
            subtotal: Money::zero(),
            savings: Money::zero(),
            tax: Money::zero(),
            total: Money::zero(),
        }
    }
}

/// Computes subtotal, savings, tax and total for `lines`.
///
/// ## Formulas
/// ```text
/// subtotal = Σ effective_unit_price × quantity
/// savings  = Σ original_price × discount/100 × quantity
/// tax      = subtotal × rate
/// total    = subtotal + tax
/// ```
pub fn price_lines(lines: &[CartLine], rate: TaxRate) -> CartTotals {
    let subtotal: Money = lines.iter().map(CartLine::line_subtotal).sum();
    let savings: Money = lines.iter().map(CartLine::line_savings).sum();
    let tax = subtotal.calculate_tax(rate);

    CartTotals {
        line_count: lines.len(),
        total_quantity: lines.iter().map(|l| l.quantity).sum(),
        subtotal,
        savings,
        tax,
        total: subtotal + tax,
    }
}

/// Aggregated lines together with their totals.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricedCart {
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
}

impl PricedCart {
    /// Aggregates and prices in one step.
    pub fn build(entries: &[CartEntry], products: &[Product], rate: TaxRate) -> Self {
        let lines = aggregate_cart(entries, products);
        let totals = price_lines(&lines, rate);
        PricedCart { lines, totals }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn order_items(&self) -> Vec<OrderItem> {
        self.lines.iter().map(CartLine::to_order_item).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Country;
    use crate::TAX_RATE;
    use chrono::Utc;

    fn product(id: i64, price: f64, discount: f64) -> Product {
        Product {
            id,
            owner_id: None,
            name: format!("Product {id}"),
            description: "A product for testing".to_string(),
            price,
            discount_percentage: discount,
            quantity: 50,
            category: "Kitchen".to_string(),
            country: Country::India,
            image: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn entry(id: i64, product_id: i64, unit_price: f64) -> CartEntry {
        CartEntry {
            id,
            user_id: 1,
            product_id,
            name: format!("Snapshot {product_id}"),
            unit_price,
            discount_percentage: 0.0,
            image: None,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_same_product_entries_fold_into_one_line() {
        let entries: Vec<_> = (1..=4).map(|id| entry(id, 7, 10.0)).collect();
        let lines = aggregate_cart(&entries, &[product(7, 10.0, 0.0)]);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 4);
        assert_eq!(lines[0].entry_ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_lines_keep_first_appearance_order() {
        let entries = vec![entry(1, 3, 1.0), entry(2, 1, 1.0), entry(3, 3, 1.0), entry(4, 2, 1.0)];
        let products = vec![product(1, 1.0, 0.0), product(2, 1.0, 0.0), product(3, 1.0, 0.0)];

        let ids: Vec<i64> = aggregate_cart(&entries, &products)
            .iter()
            .map(|l| l.product_id)
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_line_uses_current_catalog_price() {
        // Snapshot says 80, catalog now says 100 @ 20%.
        let entries = vec![entry(1, 5, 80.0), entry(2, 5, 80.0), entry(3, 5, 80.0)];
        let lines = aggregate_cart(&entries, &[product(5, 100.0, 20.0)]);
        let line = &lines[0];

        assert_eq!(line.price_source, PriceSource::Catalog);
        assert_eq!(line.effective_unit_price().amount(), 80.0);
        assert_eq!(line.line_subtotal().amount(), 240.0);
        assert_eq!(line.line_savings().amount(), 60.0);
    }

    #[test]
    fn test_missing_product_falls_back_to_snapshot() {
        let entries = vec![entry(1, 99, 42.5), entry(2, 99, 42.5)];
        let lines = aggregate_cart(&entries, &[]);
        let line = &lines[0];

        assert_eq!(line.price_source, PriceSource::Snapshot);
        assert_eq!(line.name, "Snapshot 99");
        assert_eq!(line.discount_percentage, 0.0);
        assert_eq!(line.line_subtotal().amount(), 85.0);
        assert!(line.line_savings().is_zero());
    }

    #[test]
    fn test_snapshot_keeps_its_discount() {
        let stale = CartEntry {
            discount_percentage: 10.0,
            ..entry(1, 99, 500.0)
        };
        let lines = aggregate_cart(&[stale.clone(), CartEntry { id: 2, ..stale }], &[]);
        let line = &lines[0];

        assert_eq!(line.price_source, PriceSource::Snapshot);
        assert_eq!(line.discount_percentage, 10.0);
        assert_eq!(line.line_subtotal().amount(), 900.0);
        assert_eq!(line.line_savings().amount(), 100.0);
    }

    #[test]
    fn test_two_discounted_units_totals() {
        let entries = vec![entry(1, 7, 500.0), entry(2, 7, 500.0)];
        let cart = PricedCart::build(&entries, &[product(7, 500.0, 10.0)], TAX_RATE);
        let totals = cart.totals;

        assert_eq!(cart.lines[0].quantity, 2);
        assert_eq!(cart.lines[0].effective_unit_price().amount(), 450.0);
        assert!(totals.subtotal.approx_eq(Money::from_amount(900.0)));
        assert!(totals.savings.approx_eq(Money::from_amount(100.0)));
        assert!(totals.tax.approx_eq(Money::from_amount(90.0)));
        assert!(totals.total.approx_eq(Money::from_amount(990.0)));
        assert_eq!(totals.total.to_string(), "990.00");
        assert_eq!(totals.total_quantity, 2);
    }

    #[test]
    fn test_total_is_subtotal_plus_tax() {
        let entries = vec![entry(1, 1, 0.0), entry(2, 2, 0.0), entry(3, 2, 0.0)];
        let products = vec![product(1, 19.99, 15.0), product(2, 7.35, 0.0)];
        let totals = PricedCart::build(&entries, &products, TAX_RATE).totals;

        assert!(totals.tax.approx_eq(Money::from_amount(totals.subtotal.amount() * 0.1)));
        assert!(totals.total.approx_eq(totals.subtotal + totals.tax));
    }

    #[test]
    fn test_empty_cart_has_zero_totals() {
        let cart = PricedCart::build(&[], &[product(1, 10.0, 0.0)], TAX_RATE);

        assert!(cart.is_empty());
        assert_eq!(cart.totals, CartTotals::empty());
    }

    #[test]
    fn test_order_items_freeze_line_prices() {
        let entries = vec![entry(1, 7, 500.0), entry(2, 7, 500.0)];
        let cart = PricedCart::build(&entries, &[product(7, 500.0, 10.0)], TAX_RATE);
        let items = cart.order_items();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price, 500.0);
        assert_eq!(items[0].discount_percentage, 10.0);
        assert_eq!(items[0].quantity, 2);
    }
}
