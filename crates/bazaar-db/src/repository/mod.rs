//! # Repository Module
//!
//! Repository implementations for the four store collections.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Command handler                                                       │
//! │       │                                                                 │
//! │       │  db.cart().add_units(user_id, &product, 2)                     │
//! │       ▼                                                                 │
//! │  CartRepository                                                        │
//! │  ├── add_units(&self, user_id, product, count)                         │
//! │  ├── list_for_user(&self, user_id)                                     │
//! │  └── remove_product(&self, user_id, product_id)                        │
//! │       │                                                                 │
//! │       │  SQL (one transaction for multi-row writes)                    │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`UserRepository`](user::UserRepository) - Accounts and password checks
//! - [`ProductRepository`](product::ProductRepository) - Catalog CRUD and stock
//! - [`CartRepository`](cart::CartRepository) - Per-unit cart entries
//! - [`OrderRepository`](order::OrderRepository) - Orders, placement and edits

pub mod cart;
pub mod order;
pub mod product;
pub mod user;
