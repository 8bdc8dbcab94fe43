//! # Bazaar App Library
//!
//! The application layer of the Bazaar shopping demo: startup, state and
//! one handler per user action. A frontend (or a test) opens an [`App`],
//! logs in to get a [`state::Session`] and calls into [`commands`].
//!
//! ## Module Organization
//! ```text
//! bazaar_app/
//! ├── lib.rs          ◄─── You are here (startup & tracing)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── db.rs       ◄─── Database state wrapper
//! │   ├── config.rs   ◄─── Configuration state
//! │   └── session.rs  ◄─── Logged-in user, order edit, checkout flow
//! ├── commands/
//! │   ├── mod.rs      ◄─── Command exports
//! │   ├── auth.rs     ◄─── Register/login/logout
//! │   ├── product.rs  ◄─── Browse and inventory
//! │   ├── cart.rs     ◄─── Cart manipulation
//! │   ├── checkout.rs ◄─── Checkout and admin order edit
//! │   ├── order.rs    ◄─── Orders
//! │   ├── user.rs     ◄─── Admin user management
//! │   ├── analytics.rs◄─── Dashboard
//! │   └── config.rs   ◄─── Configuration
//! └── error.rs        ◄─── API error type for commands
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Application Startup                               │
//! │                                                                         │
//! │  1. init_tracing() ───────────────────────────────────────────────────► │
//! │     • tracing-subscriber with env filter                                │
//! │     • Default: info,bazaar=debug,sqlx=warn (override with RUST_LOG)    │
//! │                                                                         │
//! │  2. get_database_path() ──────────────────────────────────────────────► │
//! │     • BAZAAR_DB_PATH if set                                             │
//! │     • else the platform data directory, e.g.                            │
//! │       Linux: ~/.local/share/shop/bazaar.db                              │
//! │                                                                         │
//! │  3. App::open() ──────────────────────────────────────────────────────► │
//! │     • Connect, WAL mode, run pending migrations                         │
//! │     • ConfigState::from_env()                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod error;
pub mod state;

#[cfg(test)]
mod test_support;

use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bazaar_db::{Database, DbConfig, DbError};
use state::{ConfigState, DbState};

/// Failures while bringing the app up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Could not determine app data directory")]
    NoDataDir,

    #[error("Could not create data directory: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Database(#[from] DbError),
}

/// Shared state every handler draws from.
#[derive(Debug, Clone)]
pub struct App {
    pub db: DbState,
    pub config: ConfigState,
}

impl App {
    /// Opens the store at [`get_database_path`] with environment config.
    pub async fn open() -> Result<Self, StartupError> {
        let path = get_database_path()?;
        App::open_at(&path).await
    }

    /// Opens (creating if needed) the store at `path`.
    pub async fn open_at(path: &Path) -> Result<Self, StartupError> {
        info!(db_path = %path.display(), "Opening Bazaar");

        let db = Database::new(DbConfig::new(path)).await?;
        info!("Database connected and migrations applied");

        Ok(App {
            db: DbState::new(db),
            config: ConfigState::from_env(),
        })
    }

    /// A throwaway store, for demos and tests.
    pub async fn in_memory() -> Result<Self, StartupError> {
        Ok(App {
            db: DbState::in_memory().await?,
            config: ConfigState::default(),
        })
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=bazaar=trace` - Show trace for bazaar crates only
/// - Default: info, with debug for bazaar crates
///
/// Calling it twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bazaar=debug,sqlx=warn"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Determines the database file path.
///
/// ## Platform-Specific Paths
/// - **macOS**: `~/Library/Application Support/com.bazaar.shop/bazaar.db`
/// - **Windows**: `%APPDATA%\bazaar\shop\data\bazaar.db`
/// - **Linux**: `~/.local/share/shop/bazaar.db`
///
/// ## Development Override
/// Set `BAZAAR_DB_PATH` to use a custom path.
pub fn get_database_path() -> Result<PathBuf, StartupError> {
    if let Ok(path) = std::env::var("BAZAAR_DB_PATH") {
        return Ok(PathBuf::from(path));
    }

    let proj_dirs = ProjectDirs::from("com", "bazaar", "shop").ok_or(StartupError::NoDataDir)?;
    let data_dir = proj_dirs.data_dir();

    std::fs::create_dir_all(data_dir)?;

    Ok(data_dir.join("bazaar.db"))
}
