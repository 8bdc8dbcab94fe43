//! # Order Commands
//!
//! Order history for customers, order management for admins.
//!
//! ## Status Changes
//! ```text
//! update_order_status(id, to)
//!      │
//!      ├── to == current ───────────► returned unchanged, nothing written
//!      ├── not in transition table ─► BUSINESS_LOGIC error
//!      ├── to == cancelled ─────────► status written + items restocked
//!      │                              (one transaction)
//!      └── otherwise ───────────────► status written
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::{DbState, Session};
use bazaar_core::orders::{
    can_mark_shipped, check_order_transition, check_payment_transition, Transition,
};
use bazaar_core::{CoreError, Order, OrderStatus, PaymentStatus};

/// Shown when an order outlives its customer's account.
const DELETED_USER: &str = "Deleted user";

/// One row of the admin order table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderRow {
    #[serde(flatten)]
    pub order: Order,
    pub customer_name: String,
}

/// Admin order table with per-status counts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderList {
    pub orders: Vec<AdminOrderRow>,
    pub status_counts: BTreeMap<OrderStatus, usize>,
}

async fn load_order(db: &DbState, id: i64) -> ApiResult<Order> {
    db.inner()
        .orders()
        .get_by_id(id)
        .await
        .map_err(|e| ApiError::storage("Failed to load order", e))?
        .ok_or_else(|| CoreError::OrderNotFound(id).into())
}

/// The session user's orders, newest first.
pub async fn my_orders(db: &DbState, session: &Session) -> ApiResult<Vec<Order>> {
    debug!(user_id = session.user_id(), "my_orders command");

    db.inner()
        .orders()
        .list_for_user(session.user_id())
        .await
        .map_err(|e| ApiError::storage("Failed to load orders", e))
}

/// One order, visible to its owner and to admins.
pub async fn order_details(db: &DbState, session: &Session, id: i64) -> ApiResult<Order> {
    debug!(id = id, "order_details command");

    let order = load_order(db, id).await?;
    if order.user_id != session.user_id() && !session.is_admin() {
        return Err(ApiError::forbidden("You can only view your own orders"));
    }

    Ok(order)
}

/// Every order, newest first, with the customer's name.
pub async fn list_all_orders(db: &DbState, session: &Session) -> ApiResult<AdminOrderList> {
    debug!("list_all_orders command");
    session.require_admin()?;

    let orders = db
        .inner()
        .orders()
        .list_all()
        .await
        .map_err(|e| ApiError::storage("Failed to load orders", e))?;
    let names: HashMap<i64, String> = db
        .inner()
        .users()
        .list()
        .await
        .map_err(|e| ApiError::storage("Failed to load orders", e))?
        .into_iter()
        .map(|u| (u.id, u.name))
        .collect();

    let mut status_counts = BTreeMap::new();
    for order in &orders {
        *status_counts.entry(order.status).or_insert(0) += 1;
    }

    let orders = orders
        .into_iter()
        .map(|order| AdminOrderRow {
            customer_name: names
                .get(&order.user_id)
                .cloned()
                .unwrap_or_else(|| DELETED_USER.to_string()),
            order,
        })
        .collect();

    Ok(AdminOrderList {
        orders,
        status_counts,
    })
}

/// Moves an order to `status`. Cancelling returns its items to stock.
pub async fn update_order_status(
    db: &DbState,
    session: &Session,
    id: i64,
    status: OrderStatus,
) -> ApiResult<Order> {
    debug!(id = id, status = %status, "update_order_status command");
    session.require_admin()?;

    let order = load_order(db, id).await?;
    if check_order_transition(order.status, status)? == Transition::Unchanged {
        return Ok(order);
    }

    let updated = db
        .inner()
        .orders()
        .update_status(id, status)
        .await
        .map_err(|e| ApiError::storage("Failed to update order status", e))?;

    info!(id = id, from = %order.status, to = %status, "Order status updated");
    Ok(updated)
}

/// Sets an order's payment status.
pub async fn update_payment_status(
    db: &DbState,
    session: &Session,
    id: i64,
    status: PaymentStatus,
) -> ApiResult<Order> {
    debug!(id = id, status = %status, "update_payment_status command");
    session.require_admin()?;

    let order = load_order(db, id).await?;
    if check_payment_transition(order.payment_status, status)? == Transition::Unchanged {
        return Ok(order);
    }

    let updated = db
        .inner()
        .orders()
        .update_payment_status(id, status)
        .await
        .map_err(|e| ApiError::storage("Failed to update payment status", e))?;

    info!(id = id, from = %order.payment_status, to = %status, "Payment status updated");
    Ok(updated)
}

/// The "Mark as shipped" row action.
pub async fn mark_shipped(db: &DbState, session: &Session, id: i64) -> ApiResult<Order> {
    debug!(id = id, "mark_shipped command");
    session.require_admin()?;

    let order = load_order(db, id).await?;
    if !can_mark_shipped(order.status) {
        return Err(ApiError::new(
            ErrorCode::BusinessLogic,
            format!("A {} order cannot be marked as shipped", order.status),
        ));
    }

    update_order_status(db, session, id, OrderStatus::Shipped).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::add_to_cart;
    use crate::commands::checkout::place_order;
    use crate::test_support::{
        address, admin_session, card, customer_session, seed_product, setup, stock,
    };

    async fn placed(db: &DbState, customer: &mut Session, product_id: i64, qty: i64) -> Order {
        let config = crate::state::ConfigState::default();
        add_to_cart(db, &config, customer, product_id, Some(qty))
            .await
            .unwrap();
        place_order(db, &config, customer, address(), card())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_history_and_visibility() {
        let (db, _) = setup().await;
        let admin = admin_session(&db).await;
        let mut customer = customer_session(&db).await;
        let lamp = seed_product(&db, &admin, "Brass Lamp", 500.0, 10.0, 5).await;

        let first = placed(&db, &mut customer, lamp, 1).await;
        let second = placed(&db, &mut customer, lamp, 1).await;

        let mine = my_orders(&db, &customer).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].id, second.id);

        assert_eq!(order_details(&db, &customer, first.id).await.unwrap().id, first.id);
        assert_eq!(order_details(&db, &admin, first.id).await.unwrap().id, first.id);
        assert!(my_orders(&db, &admin).await.unwrap().is_empty());

        let err = order_details(&db, &customer, 999).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_other_customer_cannot_view_order() {
        let (db, _) = setup().await;
        let admin = admin_session(&db).await;
        let mut customer = customer_session(&db).await;
        let lamp = seed_product(&db, &admin, "Brass Lamp", 500.0, 10.0, 5).await;
        let order = placed(&db, &mut customer, lamp, 1).await;

        let user = db
            .inner()
            .users()
            .create(
                &crate::test_support::registration("Ravi Kumar", "ravi@example.com"),
                bazaar_core::Country::India,
                bazaar_core::UserRole::Customer,
            )
            .await
            .unwrap();
        let other = Session::new(&user);

        let err = order_details(&db, &other, order.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn test_admin_list_names_and_counts() {
        let (db, _) = setup().await;
        let admin = admin_session(&db).await;
        let mut customer = customer_session(&db).await;
        let lamp = seed_product(&db, &admin, "Brass Lamp", 500.0, 10.0, 5).await;
        let order = placed(&db, &mut customer, lamp, 1).await;
        placed(&db, &mut customer, lamp, 1).await;
        update_order_status(&db, &admin, order.id, OrderStatus::Cancelled)
            .await
            .unwrap();

        let list = list_all_orders(&db, &admin).await.unwrap();
        assert_eq!(list.orders.len(), 2);
        assert_eq!(list.orders[0].customer_name, customer.user().name);
        assert_eq!(list.status_counts[&OrderStatus::Confirmed], 1);
        assert_eq!(list.status_counts[&OrderStatus::Cancelled], 1);

        db.inner().users().delete(customer.user_id()).await.unwrap();
        let list = list_all_orders(&db, &admin).await.unwrap();
        assert!(list.orders.iter().all(|r| r.customer_name == "Deleted user"));

        let err = list_all_orders(&db, &customer).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn test_status_rules_and_restock() {
        let (db, _) = setup().await;
        let admin = admin_session(&db).await;
        let mut customer = customer_session(&db).await;
        let lamp = seed_product(&db, &admin, "Brass Lamp", 500.0, 10.0, 5).await;
        let order = placed(&db, &mut customer, lamp, 2).await;
        assert_eq!(stock(&db, lamp).await, 3);

        // Same status is a no-op.
        let before = order_details(&db, &admin, order.id).await.unwrap();
        let same = update_order_status(&db, &admin, order.id, OrderStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(same.updated_at, before.updated_at);

        let err = update_order_status(&db, &admin, order.id, OrderStatus::Pending)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);

        let err = update_order_status(&db, &customer, order.id, OrderStatus::Shipped)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let cancelled = update_order_status(&db, &admin, order.id, OrderStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(stock(&db, lamp).await, 5);

        update_order_status(&db, &admin, order.id, OrderStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(stock(&db, lamp).await, 5);

        let err = update_order_status(&db, &admin, order.id, OrderStatus::Processing)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
    }

    #[tokio::test]
    async fn test_mark_shipped_and_payment() {
        let (db, _) = setup().await;
        let admin = admin_session(&db).await;
        let mut customer = customer_session(&db).await;
        let lamp = seed_product(&db, &admin, "Brass Lamp", 500.0, 10.0, 5).await;
        let order = placed(&db, &mut customer, lamp, 1).await;

        let shipped = mark_shipped(&db, &admin, order.id).await.unwrap();
        assert_eq!(shipped.status, OrderStatus::Shipped);
        let err = mark_shipped(&db, &admin, order.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);

        let refunded = update_payment_status(&db, &admin, order.id, PaymentStatus::Refunded)
            .await
            .unwrap();
        assert_eq!(refunded.payment_status, PaymentStatus::Refunded);

        let err = update_payment_status(&db, &admin, order.id, PaymentStatus::Paid)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
    }
}
