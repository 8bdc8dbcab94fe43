//! # Domain Types
//!
//! Core domain types used throughout Bazaar.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      User       │   │     Product     │   │    CartEntry    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │   │  id (i64)       │   │  one row/unit   │       │
//! │  │  email (unique) │   │  price, disc %  │   │  product_id     │       │
//! │  │  country, role  │   │  stock, country │   │  price snapshot │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Order      │   │  OrderStatus    │   │ PaymentStatus   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  items (JSON)   │   │  Pending ...    │   │  Pending        │       │
//! │  │  totals         │   │  Delivered      │   │  Paid           │       │
//! │  │  shipping addr  │   │  Cancelled      │   │  Refunded       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every stored record carries an auto-increment `i64` id assigned by the
//! store. Orders snapshot product data (name, price, discount) so later
//! catalog edits never rewrite history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Roles & Countries
// =============================================================================

/// Account role. Admins manage inventory, orders and users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Customer,
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Customer
    }
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

/// Countries the shop ships to. Products are offered per country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum Country {
    #[serde(rename = "UK")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "UK"))]
    Uk,
    #[serde(rename = "USA")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "USA"))]
    Usa,
    #[serde(rename = "India")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "India"))]
    India,
}

impl Country {
    pub const ALL: [Country; 3] = [Country::Uk, Country::Usa, Country::India];

    pub fn as_str(&self) -> &'static str {
        match self {
            Country::Uk => "UK",
            Country::Usa => "USA",
            Country::India => "India",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Country {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Country::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| format!("unknown country: {s}"))
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub age: i64,
    /// Argon2 PHC string. Never leaves the process.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    pub country: Country,
    pub role: UserRole,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Registration input (plain-text password, hashed by the store layer).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub age: i64,
    pub password: String,
    /// Raw form value; parsed into [`Country`] during validation.
    pub country: String,
}

/// Admin edit of an account. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub age: Option<i64>,
    pub country: Option<Country>,
    pub role: Option<UserRole>,
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,

    /// Admin who listed the product, if known.
    pub owner_id: Option<i64>,

    pub name: String,
    pub description: String,

    /// List price in major units.
    pub price: f64,

    /// Discount in percent (0-90).
    pub discount_percentage: f64,

    /// Units in stock.
    pub quantity: i64,

    pub category: String,

    /// Country the product is offered in.
    pub country: Country,

    /// Image URL or data URI.
    pub image: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the list price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_amount(self.price)
    }

    /// Price after the product discount.
    pub fn effective_price(&self) -> Money {
        self.price().apply_percentage_discount(self.discount_percentage)
    }

    /// Checks whether `quantity` units can be taken from stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.quantity >= quantity
    }

    pub fn is_available_in(&self, country: Country) -> bool {
        self.country == country
    }
}

/// Admin "add product" form.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    /// Raw price text as typed; at most two decimals.
    pub price: String,
    pub discount_percentage: f64,
    pub quantity: i64,
    pub category: String,
    /// Raw form value; must be one of the shipping countries.
    pub country: String,
    pub image: Option<String>,
}

/// A validated [`NewProduct`], ready to be written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub owner_id: Option<i64>,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub discount_percentage: f64,
    pub quantity: i64,
    pub category: String,
    pub country: Country,
    pub image: Option<String>,
}

/// Admin product edit. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub discount_percentage: Option<f64>,
    pub quantity: Option<i64>,
    pub category: Option<String>,
    pub image: Option<String>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.discount_percentage.is_none()
            && self.quantity.is_none()
            && self.category.is_none()
            && self.image.is_none()
    }
}

// =============================================================================
// Cart Entry
// =============================================================================

/// One unit of a product in a user's cart.
///
/// Adding three units inserts three rows. Name, price, discount and image
/// are snapshotted at add time and only used when the product has since
/// disappeared from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub name: String,
    pub unit_price: f64,
    /// Discount in force when the entry was written.
    pub discount_percentage: f64,
    pub image: Option<String>,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartEntry {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_amount(self.unit_price)
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Fulfilment status of an order.
///
/// Declaration order is the forward progression; transition rules live in
/// [`crate::orders`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order
// =============================================================================

/// A purchased line, frozen at order time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: i64,
    pub name: String,
    /// Unit list price before discount.
    pub price: f64,
    pub discount_percentage: f64,
    pub quantity: i64,
}

impl OrderItem {
    pub fn line_total(&self) -> Money {
        Money::from_amount(self.price).apply_percentage_discount(self.discount_percentage)
            * self.quantity
    }
}

/// Delivery details collected in the shipping step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub phone: String,
}

impl ShippingAddress {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

/// A placed order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    /// Customer who owns the order.
    pub user_id: i64,
    pub items: Vec<OrderItem>,
    pub subtotal: f64,
    pub savings: f64,
    pub tax: f64,
    pub total: f64,
    pub shipping_address: ShippingAddress,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_amount(self.total)
    }

    /// Units across all lines.
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == OrderStatus::Cancelled
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_wire_names() {
        assert_eq!(serde_json::to_string(&Country::Uk).unwrap(), "\"UK\"");
        assert_eq!(serde_json::to_string(&Country::Usa).unwrap(), "\"USA\"");
        assert_eq!("India".parse::<Country>().unwrap(), Country::India);
        assert!("France".parse::<Country>().is_err());
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Refunded).unwrap(),
            "\"refunded\""
        );
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: 1,
            name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
            phone: "9876543210".to_string(),
            age: 30,
            password_hash: "$argon2id$secret".to_string(),
            country: Country::India,
            role: UserRole::Customer,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"createdAt\""));
    }

    #[test]
    fn test_order_item_line_total() {
        let item = OrderItem {
            product_id: 1,
            name: "Tea".to_string(),
            price: 500.0,
            discount_percentage: 10.0,
            quantity: 2,
        };
        assert_eq!(item.line_total().amount(), 900.0);
    }

    #[test]
    fn test_product_patch_is_empty() {
        assert!(ProductPatch::default().is_empty());
        let patch = ProductPatch {
            quantity: Some(4),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
