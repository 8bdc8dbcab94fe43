//! # Analytics Commands
//!
//! Admin dashboard figures.

use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::state::{DbState, Session};
use bazaar_core::analytics::{summarize, SalesSummary};

/// Totals, status counts and per-day series over every order.
pub async fn sales_summary(db: &DbState, session: &Session) -> ApiResult<SalesSummary> {
    debug!("sales_summary command");
    session.require_admin()?;

    let total_users = db
        .inner()
        .users()
        .count()
        .await
        .map_err(|e| ApiError::storage("Failed to load analytics", e))?;
    let orders = db
        .inner()
        .orders()
        .list_all()
        .await
        .map_err(|e| ApiError::storage("Failed to load analytics", e))?;

    Ok(summarize(&orders, total_users))
}
