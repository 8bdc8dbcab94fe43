//! # User Commands
//!
//! Admin account management. All handlers require an admin session.

use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::state::{DbState, Session};
use bazaar_core::validation::validate_user_patch;
use bazaar_core::{User, UserPatch};

/// All accounts, oldest first.
pub async fn list_users(db: &DbState, session: &Session) -> ApiResult<Vec<User>> {
    debug!("list_users command");
    session.require_admin()?;

    db.inner()
        .users()
        .list()
        .await
        .map_err(|e| ApiError::storage("Failed to load users", e))
}

/// Edits profile fields or the role of an account.
pub async fn update_user(
    db: &DbState,
    session: &Session,
    id: i64,
    patch: UserPatch,
) -> ApiResult<User> {
    debug!(id = id, "update_user command");
    session.require_admin()?;

    validate_user_patch(&patch)?;

    let user = db
        .inner()
        .users()
        .update(id, &patch)
        .await
        .map_err(|e| ApiError::storage("Failed to update user", e))?;

    info!(id = id, "User updated");
    Ok(user)
}

/// Deletes an account. The account's orders are kept.
pub async fn delete_user(db: &DbState, session: &Session, id: i64) -> ApiResult<()> {
    debug!(id = id, "delete_user command");
    session.require_admin()?;

    if id == session.user_id() {
        return Err(ApiError::validation("You cannot delete your own account"));
    }

    db.inner()
        .users()
        .delete(id)
        .await
        .map_err(|e| ApiError::storage("Failed to delete user", e))?;

    info!(id = id, "User deleted");
    Ok(())
}
