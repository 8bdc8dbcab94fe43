//! # Commands Module
//!
//! One async handler per user action.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (exports)
//! ├── auth.rs       ◄─── Register, login, logout
//! ├── product.rs    ◄─── Marketplace browsing, admin inventory
//! ├── cart.rs       ◄─── Cart manipulation
//! ├── checkout.rs   ◄─── Two-step checkout, admin order edit
//! ├── order.rs      ◄─── Order history, status and payment updates
//! ├── user.rs       ◄─── Admin user management
//! ├── analytics.rs  ◄─── Admin dashboard figures
//! └── config.rs     ◄─── Configuration retrieval
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  Frontend action                                                        │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  pub async fn add_to_cart(                                              │
//! │      db: &DbState,          ◄── Shared store handle                    │
//! │      config: &ConfigState,  ◄── Tax rate, page size                    │
//! │      session: &Session,     ◄── Logged-in user, edit flag              │
//! │      product_id: i64,       ◄── From the request                       │
//! │      quantity: Option<i64>, ◄── Optional param                         │
//! │  ) -> ApiResult<CartResponse>                                           │
//! │         │                                                               │
//! │         │ (JSON serialization, camelCase)                               │
//! │         ▼                                                               │
//! │  Frontend receives: CartResponse or { code, message, fieldErrors? }    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## State Injection
//! Each command declares only the state it needs:
//! ```rust,ignore
//! // Only needs database
//! async fn list_categories(db: &DbState)
//!
//! // Needs the session to guard admin access
//! async fn list_users(db: &DbState, session: &Session)
//!
//! // Moves the checkout flow, so borrows the session mutably
//! async fn submit_payment(db: &DbState, config: &ConfigState, session: &mut Session, ..)
//! ```

pub mod analytics;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod order;
pub mod product;
pub mod user;
