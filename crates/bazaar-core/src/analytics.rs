//! # Analytics Module
//!
//! Admin dashboard figures reduced from the full order list.
//!
//! Cancelled orders count toward order totals and status counts, but never
//! toward revenue.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Order, OrderStatus};

/// Dashboard summary.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub total_users: i64,
    pub total_orders: usize,
    /// Sum of order totals, cancelled excluded.
    pub total_revenue: Money,
    /// Only statuses that occur are present.
    pub status_counts: BTreeMap<OrderStatus, usize>,
    /// Keyed by UTC day, `YYYY-MM-DD`.
    pub orders_per_day: BTreeMap<String, usize>,
    /// Keyed by UTC day, cancelled excluded.
    pub revenue_per_day: BTreeMap<String, Money>,
}

/// Folds `orders` into a [`SalesSummary`].
pub fn summarize(orders: &[Order], total_users: i64) -> SalesSummary {
    let mut summary = SalesSummary {
        total_users,
        total_orders: orders.len(),
        total_revenue: Money::zero(),
        status_counts: BTreeMap::new(),
        orders_per_day: BTreeMap::new(),
        revenue_per_day: BTreeMap::new(),
    };

    for order in orders {
        let day = order.created_at.format("%Y-%m-%d").to_string();

        *summary.status_counts.entry(order.status).or_default() += 1;
        *summary.orders_per_day.entry(day.clone()).or_default() += 1;

        if !order.is_cancelled() {
            summary.total_revenue += order.total();
            *summary.revenue_per_day.entry(day).or_default() += order.total();
        }
    }

    summary
}

// =============================================================================
// Unit Tests
// =============================================================================
