//! # bazaar-core: Pure Business Logic for Bazaar
//!
//! This crate holds the shop's business rules as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bazaar Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Browser Frontend                             │   │
//! │  │   Marketplace ──► Cart ──► Checkout ──► Orders ──► Admin panel  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  bazaar-app (command handlers)                  │   │
//! │  │    login, add_to_cart, place_order, update_order_status, ...    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bazaar-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌────────┐ ┌───────────┐  │   │
//! │  │  │  types  │ │ pricing │ │ checkout │ │ orders │ │ analytics │  │   │
//! │  │  │ Product │ │ CartLine│ │  steps   │ │ status │ │  revenue  │  │   │
//! │  │  │  Order  │ │ Totals  │ │  fields  │ │ table  │ │  per day  │  │   │
//! │  │  └─────────┘ └─────────┘ └──────────┘ └────────┘ └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 bazaar-db (Database Layer)                      │   │
//! │  │            SQLite queries, migrations, repositories             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (User, Product, CartEntry, Order, ...)
//! - [`money`] - Money newtype and tax rate arithmetic
//! - [`pricing`] - Cart aggregation and subtotal/savings/tax/total
//! - [`checkout`] - Shipping → Payment field validation flow
//! - [`orders`] - Order and payment status transition rules
//! - [`catalog`] - Marketplace filtering and inventory paging
//! - [`analytics`] - Admin dashboard reductions over orders
//! - [`validation`] - Product and account field validators
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use bazaar_core::money::Money;
//! use bazaar_core::TAX_RATE;
//!
//! let subtotal = Money::from_amount(900.0);
//! let tax = subtotal.calculate_tax(TAX_RATE);
//!
//! assert_eq!(tax.amount(), 90.0);
//! assert_eq!((subtotal + tax).to_string(), "990.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod analytics;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod money;
pub mod orders;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use money::{Money, TaxRate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Sales tax applied to every cart: 10% (1000 basis points).
pub const TAX_RATE: TaxRate = TaxRate::from_bps(1000);

/// Highest discount an admin may put on a product, in percent.
pub const MAX_DISCOUNT_PERCENTAGE: f64 = 90.0;

/// Maximum units of one product added to the cart in a single action.
///
/// Each unit becomes its own cart row, so this also bounds the size of the
/// insert transaction.
pub const MAX_ADD_QUANTITY: i64 = 999;

/// Default page size of the admin inventory table.
pub const DEFAULT_PAGE_SIZE: usize = 10;
