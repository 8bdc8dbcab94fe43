//! # Database State
//!
//! Wraps the `Database` handle for use in command handlers.
//!
//! ## Thread Safety
//! The `Database` struct from `bazaar-db` contains a `SqlitePool`, which
//! is thread-safe. Handlers share one `DbState` without extra locking.
//!
//! ## Usage in Handlers
//! ```rust,ignore
//! pub async fn cart_count(db: &DbState, session: &Session) -> ApiResult<i64> {
//!     Ok(db.inner().cart().count_for_user(session.user_id()).await?)
//! }
//! ```

use bazaar_db::{Database, DbConfig, DbResult};

/// Wrapper around `Database` handed to every handler that touches the store.
#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    /// Creates a new DbState wrapping the database connection.
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Opens a private in-memory store with the schema applied.
    pub async fn in_memory() -> DbResult<Self> {
        Ok(DbState::new(Database::new(DbConfig::in_memory()).await?))
    }

    /// Returns a reference to the inner Database.
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
