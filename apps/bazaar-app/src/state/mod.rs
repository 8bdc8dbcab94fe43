//! # State Module
//!
//! State handed to command handlers.
//!
//! Each handler takes only the pieces it needs:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────┐          │
//! │  │   DbState    │  │   ConfigState    │  │     Session      │          │
//! │  │              │  │                  │  │                  │          │
//! │  │  Database    │  │  store_name      │  │  user            │          │
//! │  │  (SQLite     │  │  tax_rate_bps    │  │  editing_order   │          │
//! │  │   pool)      │  │  page_size       │  │  checkout flow   │          │
//! │  └──────────────┘  └──────────────────┘  └──────────────────┘          │
//! │                                                                         │
//! │  • DbState: Database has an internal connection pool                   │
//! │  • ConfigState: Read-only after initialization                         │
//! │  • Session: Owned by the caller, borrowed per handler call             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod session;

pub use config::ConfigState;
pub use db::DbState;
pub use session::{Session, SessionUser};
