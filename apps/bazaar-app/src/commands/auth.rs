//! # Account Commands
//!
//! Registration, login and logout.
//!
//! ## Login Outcomes
//! ```text
//! login(email, password)
//!      │
//!      ├── either field blank ──────► "Please fill in all fields"
//!      ├── no account for email ────► "User not found. Please register first."
//!      ├── password mismatch ───────► "Invalid password. Please try again."
//!      └── ok ──────────────────────► Session
//! ```

use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::state::{DbState, Session};
use bazaar_core::validation::validate_registration;
use bazaar_core::{NewUser, User, UserRole};
use bazaar_db::DbError;

/// Creates a customer account.
///
/// ## Errors
/// - Validation message for the first invalid field
/// - "An account with this email already exists"
pub async fn register_user(db: &DbState, form: NewUser) -> ApiResult<User> {
    debug!(email = %form.email.trim(), "register_user command");

    let country = validate_registration(&form)?;

    let user = db
        .inner()
        .users()
        .create(&form, country, UserRole::Customer)
        .await
        .map_err(|e| match e {
            DbError::UniqueViolation { .. } => {
                ApiError::validation("An account with this email already exists")
            }
            other => ApiError::storage("Registration failed. Please try again.", other),
        })?;

    info!(user_id = user.id, "User registered");
    Ok(user)
}

/// Checks credentials and opens a session.
pub async fn login(db: &DbState, email: &str, password: &str) -> ApiResult<Session> {
    debug!(email = %email.trim(), "login command");

    if email.trim().is_empty() || password.is_empty() {
        return Err(ApiError::validation("Please fill in all fields"));
    }

    let (user, ok) = db
        .inner()
        .users()
        .authenticate(email, password)
        .await
        .map_err(|e| ApiError::storage("Login failed. Please try again.", e))?
        .ok_or_else(|| ApiError::authentication("User not found. Please register first."))?;

    if !ok {
        return Err(ApiError::authentication("Invalid password. Please try again."));
    }

    let session = Session::new(&user);
    info!(
        user_id = user.id,
        session_id = %session.session_id(),
        role = ?user.role,
        "User logged in"
    );
    Ok(session)
}

/// Ends a session. Edit and checkout flags go with it.
pub fn logout(session: Session) {
    info!(
        user_id = session.user_id(),
        session_id = %session.session_id(),
        "User logged out"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_support::{registration, setup};

    #[tokio::test]
    async fn test_register_then_login() {
        let (db, _) = setup().await;

        let user = register_user(&db, registration("Meera Iyer", "meera@example.com"))
            .await
            .unwrap();
        assert_eq!(user.role, UserRole::Customer);

        let session = login(&db, "meera@example.com", "Secur3!pass").await.unwrap();
        assert_eq!(session.user_id(), user.id);
        assert!(!session.is_admin());

        logout(session);
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_and_duplicate() {
        let (db, _) = setup().await;

        let mut weak = registration("Meera Iyer", "meera@example.com");
        weak.password = "password".to_string();
        let err = register_user(&db, weak).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        register_user(&db, registration("Meera Iyer", "meera@example.com"))
            .await
            .unwrap();
        let err = register_user(&db, registration("Meera Two", "meera@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.message, "An account with this email already exists");
    }

    #[tokio::test]
    async fn test_login_messages() {
        let (db, _) = setup().await;
        register_user(&db, registration("Meera Iyer", "meera@example.com"))
            .await
            .unwrap();

        let err = login(&db, "", "x").await.unwrap_err();
        assert_eq!(err.message, "Please fill in all fields");

        let err = login(&db, "ghost@example.com", "Secur3!pass").await.unwrap_err();
        assert_eq!(err.message, "User not found. Please register first.");
        assert_eq!(err.code, ErrorCode::AuthenticationFailed);

        let err = login(&db, "meera@example.com", "Wrong!pass1").await.unwrap_err();
        assert_eq!(err.message, "Invalid password. Please try again.");
    }
}
