//! # Checkout Commands
//!
//! Drives the two-step checkout and writes the order.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Checkout                                        │
//! │                                                                         │
//! │  start_checkout ──► [Shipping] ── submit_shipping ──► [Payment]        │
//! │                         ▲                                 │             │
//! │                         └────────── checkout_back ────────┤             │
//! │                                                           │             │
//! │                                               submit_payment            │
//! │                                                           │             │
//! │                      ┌────────────────────────────────────┴──────┐      │
//! │                      ▼                                           ▼      │
//! │            NewOrder: place_order                AdminEdit: replace_order│
//! │            (stock taken, cart cleared)          (stock diffed, status,  │
//! │                                                  owner, date kept)      │
//! │                                                                         │
//! │  A failed step leaves the flow where it was and writes nothing.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Admin Order Edit
//! `begin_order_edit` copies an order's lines into the admin's cart and
//! marks the session. The admin adjusts the cart as usual; the next
//! checkout rewrites that order instead of creating a new one.

use serde::Serialize;
use tracing::{debug, info};

use crate::commands::cart::{cart_response, load_priced_cart, CartResponse};
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::{ConfigState, DbState, Session};
use bazaar_core::checkout::{CheckoutFlow, CheckoutMode, CheckoutStep, PaymentDetails};
use bazaar_core::{CoreError, Order, ShippingAddress};
use bazaar_db::DbError;

const ORDER_FAILED: &str = "Error placing order. Please try again.";

/// Checkout page state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutView {
    pub step: CheckoutStep,
    pub mode: CheckoutMode,
    /// Shipping details accepted so far, for refilling the form.
    pub shipping: Option<ShippingAddress>,
    pub cart: CartResponse,
}

fn no_checkout() -> ApiError {
    ApiError::new(ErrorCode::BusinessLogic, "Checkout has not been started")
}

/// Turns a failed order write into a user message.
///
/// A stock shortfall is reported with the product's name and what is
/// left; everything else becomes [`ORDER_FAILED`].
async fn order_write_error(db: &DbState, err: DbError) -> ApiError {
    match err {
        DbError::InsufficientStock {
            product_id,
            requested,
        } => match db.inner().products().get_by_id(product_id).await {
            Ok(Some(product)) => ApiError::from(CoreError::InsufficientStock {
                name: product.name,
                available: product.quantity,
                requested,
            }),
            _ => ApiError::from(DbError::InsufficientStock {
                product_id,
                requested,
            }),
        },
        other => ApiError::storage(ORDER_FAILED, other),
    }
}

/// Opens the checkout for the current cart.
///
/// The mode follows the session: an admin with an order under edit gets
/// an edit checkout, everyone else a new order. An edit checkout starts
/// with the order's shipping address filled in.
pub async fn start_checkout(
    db: &DbState,
    config: &ConfigState,
    session: &mut Session,
) -> ApiResult<CheckoutView> {
    debug!(user_id = session.user_id(), "start_checkout command");

    let cart = cart_response(db, config, session).await?;
    if cart.lines.is_empty() {
        return Err(CoreError::EmptyCart.into());
    }

    let flow = match session.editing_order() {
        Some(order_id) => {
            let order = db
                .inner()
                .orders()
                .get_by_id(order_id)
                .await
                .map_err(|e| ApiError::storage("Failed to load order", e))?
                .ok_or(CoreError::OrderNotFound(order_id))?;
            CheckoutFlow::prefilled(CheckoutMode::AdminEdit { order_id }, order.shipping_address)
        }
        None => CheckoutFlow::new(CheckoutMode::NewOrder),
    };

    let view = CheckoutView {
        step: flow.step(),
        mode: flow.mode(),
        shipping: flow.shipping().cloned(),
        cart,
    };
    session.set_checkout(Some(flow));

    Ok(view)
}

/// Validates the shipping form and moves to the payment step.
///
/// Every invalid field is reported at once in `fieldErrors`.
pub fn submit_shipping(session: &mut Session, address: ShippingAddress) -> ApiResult<CheckoutStep> {
    debug!("submit_shipping command");

    let flow = session.checkout_mut().ok_or_else(no_checkout)?;
    flow.submit_shipping(address)?;

    Ok(flow.step())
}

/// Steps back from payment to shipping, keeping the entered address.
pub fn checkout_back(session: &mut Session) -> ApiResult<CheckoutStep> {
    debug!("checkout_back command");

    let flow = session.checkout_mut().ok_or_else(no_checkout)?;
    flow.back()?;

    Ok(flow.step())
}

/// Validates payment and writes the order.
///
/// ## What This Does
/// 1. Validates the card fields (skipped for an admin edit)
/// 2. Re-reads and prices the cart
/// 3. New order: inserts it, takes stock, clears the cart (one transaction)
///    Admin edit: rewrites the order, adjusts stock, clears the cart
/// 4. Closes the checkout and any order edit
///
/// On any failure the flow stays on the payment step and nothing is
/// written.
pub async fn submit_payment(
    db: &DbState,
    config: &ConfigState,
    session: &mut Session,
    payment: PaymentDetails,
) -> ApiResult<Order> {
    debug!(user_id = session.user_id(), "submit_payment command");

    // Work on a copy so a failed write leaves the session's flow untouched.
    let mut attempt = session.checkout().cloned().ok_or_else(no_checkout)?;
    let submission = attempt.submit_payment(&payment)?;

    let cart = load_priced_cart(db, config, session.user_id())
        .await
        .map_err(|e| ApiError::storage(ORDER_FAILED, e))?;
    if cart.is_empty() {
        return Err(CoreError::EmptyCart.into());
    }

    let orders = db.inner().orders();
    let written = match submission.mode {
        CheckoutMode::NewOrder => {
            orders
                .place_order(session.user_id(), &cart, &submission.shipping)
                .await
        }
        CheckoutMode::AdminEdit { order_id } => {
            session.require_admin()?;
            orders
                .replace_order(order_id, session.user_id(), &cart, &submission.shipping)
                .await
        }
    };

    let order = match written {
        Ok(order) => order,
        Err(e) => return Err(order_write_error(db, e).await),
    };

    session.set_checkout(None);
    match submission.mode {
        CheckoutMode::NewOrder => {
            info!(order_id = order.id, user_id = order.user_id, total = order.total, "Order placed");
        }
        CheckoutMode::AdminEdit { order_id } => {
            session.finish_edit();
            info!(order_id = order_id, editor_id = session.user_id(), "Order updated");
        }
    }

    Ok(order)
}

/// Runs the whole checkout in one call: start, shipping, payment.
pub async fn place_order(
    db: &DbState,
    config: &ConfigState,
    session: &mut Session,
    shipping: ShippingAddress,
    payment: PaymentDetails,
) -> ApiResult<Order> {
    debug!(user_id = session.user_id(), "place_order command");

    start_checkout(db, config, session).await?;
    submit_shipping(session, shipping)?;
    submit_payment(db, config, session, payment).await
}

/// Loads an order's lines into the admin's cart for editing.
///
/// Replaces whatever the admin had in the cart. Cancelled orders have
/// already returned their stock and cannot be edited.
pub async fn begin_order_edit(
    db: &DbState,
    config: &ConfigState,
    session: &mut Session,
    order_id: i64,
) -> ApiResult<CartResponse> {
    debug!(order_id = order_id, "begin_order_edit command");
    session.require_admin()?;

    let order = db
        .inner()
        .orders()
        .get_by_id(order_id)
        .await
        .map_err(|e| ApiError::storage("Failed to load order", e))?
        .ok_or(CoreError::OrderNotFound(order_id))?;

    if order.is_cancelled() {
        return Err(ApiError::new(
            ErrorCode::BusinessLogic,
            "Cancelled orders cannot be edited",
        ));
    }

    db.inner()
        .cart()
        .load_items(session.user_id(), &order.items)
        .await
        .map_err(|e| ApiError::storage("Failed to load order for editing", e))?;

    session.begin_edit(order_id);
    info!(order_id = order_id, editor_id = session.user_id(), "Order edit started");

    cart_response(db, config, session).await
}

/// Abandons an order edit and empties the admin's cart.
pub async fn cancel_order_edit(
    db: &DbState,
    config: &ConfigState,
    session: &mut Session,
) -> ApiResult<CartResponse> {
    debug!("cancel_order_edit command");

    let order_id = session
        .editing_order()
        .ok_or_else(|| ApiError::new(ErrorCode::BusinessLogic, "No order is being edited"))?;

    db.inner()
        .cart()
        .clear(session.user_id())
        .await
        .map_err(|e| ApiError::storage("Failed to clear cart", e))?;

    session.finish_edit();
    session.set_checkout(None);
    info!(order_id = order_id, "Order edit abandoned");

    cart_response(db, config, session).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::add_to_cart;
    use crate::test_support::{
        address, admin_session, card, customer_session, seed_product, setup, stock,
    };
    use bazaar_core::{OrderStatus, PaymentStatus};

    #[tokio::test]
    async fn test_end_to_end_order() {
        let (db, config) = setup().await;
        let admin = admin_session(&db).await;
        let mut customer = customer_session(&db).await;
        let lamp = seed_product(&db, &admin, "Brass Lamp", 500.0, 10.0, 5).await;

        add_to_cart(&db, &config, &customer, lamp, Some(2)).await.unwrap();
        let order = place_order(&db, &config, &mut customer, address(), card())
            .await
            .unwrap();

        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 2);
        assert!((order.subtotal - 900.0).abs() < 1e-9);
        assert!((order.savings - 100.0).abs() < 1e-9);
        assert!((order.tax - 90.0).abs() < 1e-9);
        assert!((order.total - 990.0).abs() < 1e-9);
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.user_id, customer.user_id());

        assert_eq!(stock(&db, lamp).await, 3);
        assert_eq!(db.inner().cart().count_for_user(customer.user_id()).await.unwrap(), 0);
        assert!(customer.checkout().is_none());
    }

    #[tokio::test]
    async fn test_bad_postal_code_creates_no_order() {
        let (db, config) = setup().await;
        let admin = admin_session(&db).await;
        let mut customer = customer_session(&db).await;
        let lamp = seed_product(&db, &admin, "Brass Lamp", 500.0, 10.0, 5).await;
        add_to_cart(&db, &config, &customer, lamp, Some(1)).await.unwrap();

        let mut bad = address();
        bad.postal_code = "12".to_string();
        let err = place_order(&db, &config, &mut customer, bad, card())
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::CheckoutInvalid);
        let fields = err.field_errors.unwrap();
        assert_eq!(fields["postalCode"], "Postal code must be 5-10 digits");
        assert_eq!(fields.len(), 1);

        assert_eq!(db.inner().orders().count().await.unwrap(), 0);
        assert_eq!(db.inner().cart().count_for_user(customer.user_id()).await.unwrap(), 1);
        assert_eq!(stock(&db, lamp).await, 5);
        assert_eq!(customer.checkout().unwrap().step(), CheckoutStep::Shipping);
    }

    #[tokio::test]
    async fn test_step_by_step_with_back_and_bad_card() {
        let (db, config) = setup().await;
        let admin = admin_session(&db).await;
        let mut customer = customer_session(&db).await;
        let lamp = seed_product(&db, &admin, "Brass Lamp", 500.0, 10.0, 5).await;
        add_to_cart(&db, &config, &customer, lamp, Some(1)).await.unwrap();

        let err = submit_shipping(&mut customer, address()).unwrap_err();
        assert_eq!(err.message, "Checkout has not been started");

        let view = start_checkout(&db, &config, &mut customer).await.unwrap();
        assert_eq!(view.mode, CheckoutMode::NewOrder);

        // Payment before shipping is out of order.
        let err = submit_payment(&db, &config, &mut customer, card())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);

        assert_eq!(submit_shipping(&mut customer, address()).unwrap(), CheckoutStep::Payment);
        assert_eq!(checkout_back(&mut customer).unwrap(), CheckoutStep::Shipping);
        assert_eq!(
            customer.checkout().unwrap().shipping(),
            Some(&address())
        );
        submit_shipping(&mut customer, address()).unwrap();

        let mut bad_card = card();
        bad_card.expiry_date = "1/27".to_string();
        bad_card.cvv = "12".to_string();
        let err = submit_payment(&db, &config, &mut customer, bad_card)
            .await
            .unwrap_err();
        let fields = err.field_errors.unwrap();
        assert_eq!(fields["expiryDate"], "Format: MM/YY");
        assert!(fields.contains_key("cvv"));
        assert_eq!(db.inner().orders().count().await.unwrap(), 0);
        assert_eq!(customer.checkout().unwrap().step(), CheckoutStep::Payment);

        let order = submit_payment(&db, &config, &mut customer, card()).await.unwrap();
        assert_eq!(db.inner().orders().count().await.unwrap(), 1);
        assert_eq!(order.shipping_address, address());
    }

    #[tokio::test]
    async fn test_empty_cart_cannot_check_out() {
        let (db, config) = setup().await;
        let mut customer = customer_session(&db).await;

        let err = start_checkout(&db, &config, &mut customer).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);
        assert!(customer.checkout().is_none());
    }

    #[tokio::test]
    async fn test_stock_shortfall_reports_product() {
        let (db, config) = setup().await;
        let mut admin = admin_session(&db).await;
        let mut customer = customer_session(&db).await;
        let lamp = seed_product(&db, &admin, "Brass Lamp", 500.0, 10.0, 2).await;

        add_to_cart(&db, &config, &customer, lamp, Some(2)).await.unwrap();
        // Someone else bought one in the meantime.
        add_to_cart(&db, &config, &admin, lamp, Some(1)).await.unwrap();
        place_order(&db, &config, &mut admin, address(), card())
            .await
            .unwrap();

        start_checkout(&db, &config, &mut customer).await.unwrap();
        submit_shipping(&mut customer, address()).unwrap();
        let err = submit_payment(&db, &config, &mut customer, card())
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.message, "Only 1 Brass Lamp in stock (2 requested)");
        assert_eq!(db.inner().orders().count().await.unwrap(), 1);
        assert_eq!(db.inner().cart().count_for_user(customer.user_id()).await.unwrap(), 2);
        assert_eq!(customer.checkout().unwrap().step(), CheckoutStep::Payment);
    }

    #[tokio::test]
    async fn test_admin_edit_rewrites_order() {
        let (db, config) = setup().await;
        let mut admin = admin_session(&db).await;
        let mut customer = customer_session(&db).await;
        let lamp = seed_product(&db, &admin, "Brass Lamp", 500.0, 10.0, 5).await;
        let rug = seed_product(&db, &admin, "Cotton Rug", 1200.0, 0.0, 5).await;

        add_to_cart(&db, &config, &customer, lamp, Some(2)).await.unwrap();
        let original = place_order(&db, &config, &mut customer, address(), card())
            .await
            .unwrap();
        assert_eq!(stock(&db, lamp).await, 3);

        let cart = begin_order_edit(&db, &config, &mut admin, original.id)
            .await
            .unwrap();
        assert_eq!(cart.editing_order, Some(original.id));
        assert_eq!(cart.lines[0].quantity, 2);

        add_to_cart(&db, &config, &admin, rug, Some(1)).await.unwrap();
        let view = start_checkout(&db, &config, &mut admin).await.unwrap();
        assert_eq!(view.mode, CheckoutMode::AdminEdit { order_id: original.id });
        assert_eq!(view.step, CheckoutStep::Shipping);
        assert_eq!(view.shipping, Some(address()));

        let mut moved = address();
        moved.city = "Mumbai".to_string();
        submit_shipping(&mut admin, moved).unwrap();
        // Card details are not re-checked for an edit.
        let edited = submit_payment(&db, &config, &mut admin, PaymentDetails::default())
            .await
            .unwrap();

        assert_eq!(edited.id, original.id);
        assert_eq!(edited.user_id, customer.user_id());
        assert_eq!(edited.status, original.status);
        assert_eq!(edited.created_at, original.created_at);
        assert_eq!(edited.items.len(), 2);
        assert!((edited.total - (990.0 + 1320.0)).abs() < 1e-9);
        assert_eq!(edited.shipping_address.city, "Mumbai");

        assert_eq!(stock(&db, lamp).await, 3);
        assert_eq!(stock(&db, rug).await, 4);
        assert!(admin.editing_order().is_none());
        assert_eq!(db.inner().orders().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_new_order_checkout_starts_blank() {
        let (db, config) = setup().await;
        let admin = admin_session(&db).await;
        let mut customer = customer_session(&db).await;
        let lamp = seed_product(&db, &admin, "Brass Lamp", 500.0, 10.0, 5).await;
        add_to_cart(&db, &config, &customer, lamp, Some(1)).await.unwrap();

        let view = start_checkout(&db, &config, &mut customer).await.unwrap();
        assert_eq!(view.step, CheckoutStep::Shipping);
        assert!(view.shipping.is_none());
    }

    #[tokio::test]
    async fn test_order_cancelled_during_edit_is_not_rewritten() {
        let (db, config) = setup().await;
        let mut admin = admin_session(&db).await;
        let mut customer = customer_session(&db).await;
        let lamp = seed_product(&db, &admin, "Brass Lamp", 500.0, 10.0, 5).await;
        add_to_cart(&db, &config, &customer, lamp, Some(2)).await.unwrap();
        let order = place_order(&db, &config, &mut customer, address(), card())
            .await
            .unwrap();

        begin_order_edit(&db, &config, &mut admin, order.id).await.unwrap();
        add_to_cart(&db, &config, &admin, lamp, Some(1)).await.unwrap();
        start_checkout(&db, &config, &mut admin).await.unwrap();
        submit_shipping(&mut admin, address()).unwrap();

        // Someone cancels the order while the admin is still editing.
        db.inner()
            .orders()
            .update_status(order.id, OrderStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(stock(&db, lamp).await, 5);

        let err = submit_payment(&db, &config, &mut admin, PaymentDetails::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
        assert_eq!(err.message, "Cancelled orders cannot be edited");

        assert_eq!(stock(&db, lamp).await, 5);
        let stored = db.inner().orders().get_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Cancelled);
        assert_eq!(stored.items[0].quantity, 2);
        assert_eq!(admin.checkout().unwrap().step(), CheckoutStep::Payment);
        assert_eq!(admin.editing_order(), Some(order.id));
    }

    #[tokio::test]
    async fn test_unchanged_edit_keeps_total_after_product_removed() {
        let (db, config) = setup().await;
        let mut admin = admin_session(&db).await;
        let mut customer = customer_session(&db).await;
        let lamp = seed_product(&db, &admin, "Brass Lamp", 500.0, 10.0, 5).await;
        add_to_cart(&db, &config, &customer, lamp, Some(2)).await.unwrap();
        let original = place_order(&db, &config, &mut customer, address(), card())
            .await
            .unwrap();
        assert!((original.total - 990.0).abs() < 1e-9);

        db.inner().products().delete(lamp).await.unwrap();

        begin_order_edit(&db, &config, &mut admin, original.id).await.unwrap();
        start_checkout(&db, &config, &mut admin).await.unwrap();
        submit_shipping(&mut admin, address()).unwrap();
        let edited = submit_payment(&db, &config, &mut admin, PaymentDetails::default())
            .await
            .unwrap();

        assert_eq!(edited.items[0].discount_percentage, 10.0);
        assert!((edited.subtotal - 900.0).abs() < 1e-9);
        assert!((edited.savings - 100.0).abs() < 1e-9);
        assert!((edited.total - 990.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_order_edit_guards() {
        let (db, config) = setup().await;
        let mut admin = admin_session(&db).await;
        let mut customer = customer_session(&db).await;
        let lamp = seed_product(&db, &admin, "Brass Lamp", 500.0, 10.0, 5).await;
        add_to_cart(&db, &config, &customer, lamp, Some(1)).await.unwrap();
        let order = place_order(&db, &config, &mut customer, address(), card())
            .await
            .unwrap();

        let err = begin_order_edit(&db, &config, &mut customer, order.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let err = begin_order_edit(&db, &config, &mut admin, 999).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        begin_order_edit(&db, &config, &mut admin, order.id).await.unwrap();
        let cart = cancel_order_edit(&db, &config, &mut admin).await.unwrap();
        assert!(cart.lines.is_empty());
        assert!(admin.editing_order().is_none());

        db.inner()
            .orders()
            .update_status(order.id, OrderStatus::Cancelled)
            .await
            .unwrap();
        let err = begin_order_edit(&db, &config, &mut admin, order.id)
            .await
            .unwrap_err();
        assert_eq!(err.message, "Cancelled orders cannot be edited");
    }
}
