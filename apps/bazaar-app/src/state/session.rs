//! # Session State
//!
//! The logged-in user plus the per-session flags: an in-progress checkout
//! and the order an admin is editing.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Session Lifecycle                                    │
//! │                                                                         │
//! │  login() ──────► Session { user, editing_order: None, checkout: None } │
//! │                      │                                                  │
//! │                      │  &Session / &mut Session passed to handlers      │
//! │                      ▼                                                  │
//! │   begin_order_edit ─► editing_order = Some(id)   (admin only)          │
//! │   start_checkout ───► checkout = Some(CheckoutFlow)                    │
//! │   submit_payment ───► checkout = None, editing_order = None            │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │  logout(session) ── consumes the value; nothing survives it            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here is persisted.

use bazaar_core::checkout::CheckoutFlow;
use bazaar_core::{Country, Product, User, UserRole};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// The account a session belongs to, without credentials.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub country: Country,
    pub role: UserRole,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        SessionUser {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            country: user.country,
            role: user.role,
        }
    }
}

/// One logged-in session.
#[derive(Debug, Clone)]
pub struct Session {
    session_id: Uuid,
    user: SessionUser,
    editing_order: Option<i64>,
    checkout: Option<CheckoutFlow>,
    started_at: DateTime<Utc>,
}

impl Session {
    /// Starts a session for an authenticated user.
    pub fn new(user: &User) -> Self {
        Session {
            session_id: Uuid::new_v4(),
            user: SessionUser::from(user),
            editing_order: None,
            checkout: None,
            started_at: Utc::now(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn user(&self) -> &SessionUser {
        &self.user
    }

    pub fn user_id(&self) -> i64 {
        self.user.id
    }

    pub fn is_admin(&self) -> bool {
        self.user.role.is_admin()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Guard for admin-only handlers.
    pub fn require_admin(&self) -> ApiResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Admin access required"))
        }
    }

    /// Customers see only their own country's products; admins see all.
    pub fn can_see(&self, product: &Product) -> bool {
        self.is_admin() || product.is_available_in(self.user.country)
    }

    /// The order whose items are loaded in this admin's cart, if any.
    pub fn editing_order(&self) -> Option<i64> {
        self.editing_order
    }

    pub(crate) fn begin_edit(&mut self, order_id: i64) {
        self.editing_order = Some(order_id);
        self.checkout = None;
    }

    pub(crate) fn finish_edit(&mut self) {
        self.editing_order = None;
    }

    pub fn checkout(&self) -> Option<&CheckoutFlow> {
        self.checkout.as_ref()
    }

    pub(crate) fn checkout_mut(&mut self) -> Option<&mut CheckoutFlow> {
        self.checkout.as_mut()
    }

    pub(crate) fn set_checkout(&mut self, flow: Option<CheckoutFlow>) {
        self.checkout = flow;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> User {
        User {
            id: 4,
            name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
            phone: "9876543210".to_string(),
            age: 31,
            password_hash: "$argon2id$placeholder".to_string(),
            country: Country::India,
            role,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_new_session_has_no_flags() {
        let session = Session::new(&user(UserRole::Customer));

        assert_eq!(session.user_id(), 4);
        assert_eq!(session.user().country, Country::India);
        assert!(session.editing_order().is_none());
        assert!(session.checkout().is_none());
        assert!(!session.is_admin());
    }

    #[test]
    fn test_require_admin() {
        let customer = Session::new(&user(UserRole::Customer));
        let admin = Session::new(&user(UserRole::Admin));

        assert!(customer.require_admin().is_err());
        assert!(admin.require_admin().is_ok());
    }

    #[test]
    fn test_customers_see_only_their_country() {
        let customer = Session::new(&user(UserRole::Customer));
        let admin = Session::new(&user(UserRole::Admin));

        let mut product = Product {
            id: 1,
            owner_id: None,
            name: "Tea Caddy".to_string(),
            description: "Tin caddy".to_string(),
            price: 300.0,
            discount_percentage: 0.0,
            quantity: 5,
            category: "Home".to_string(),
            country: Country::Uk,
            image: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(!customer.can_see(&product));
        assert!(admin.can_see(&product));

        product.country = Country::India;
        assert!(customer.can_see(&product));
    }

    #[test]
    fn test_edit_flag_lifecycle() {
        let mut session = Session::new(&user(UserRole::Admin));

        session.begin_edit(12);
        assert_eq!(session.editing_order(), Some(12));

        session.finish_edit();
        assert!(session.editing_order().is_none());
    }

    #[test]
    fn test_sessions_get_distinct_ids() {
        let a = Session::new(&user(UserRole::Customer));
        let b = Session::new(&user(UserRole::Customer));
        assert_ne!(a.session_id(), b.session_id());
    }
}
