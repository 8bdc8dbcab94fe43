//! # API Error Type
//!
//! Unified error type for command handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Bazaar                                 │
//! │                                                                         │
//! │  Frontend                    Rust Backend                               │
//! │  ────────                    ────────────                               │
//! │                                                                         │
//! │  submitPayment(...)                                                     │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Handler                                                 │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Storage failure? ── DbError ── error!(..) ── short message ───┐ │  │
//! │  │         │                                                      │ │  │
//! │  │         ▼                                                      ▼ │  │
//! │  │  Rule broken? ─── CoreError / ValidationError ────────── ApiError│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  e.code = "CHECKOUT_INVALID"                                           │
//! │  e.message = "Please correct the highlighted fields"                    │
//! │  e.fieldErrors = { postalCode: "Postal code must be 5-10 digits" }     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storage errors never reach the user verbatim: the handler logs the
//! underlying [`DbError`] and returns its own short message.

use bazaar_core::CoreError;
use bazaar_core::ValidationError;
use bazaar_db::DbError;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::error;

/// API error returned from command handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Product not found: 42"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Per-field messages for the checkout form, keyed by field name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<BTreeMap<String, String>>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Checkout form has invalid fields
    CheckoutInvalid,

    /// Storage operation failed
    DatabaseError,

    /// Business rule violated
    BusinessLogic,

    /// Cart operation failed
    CartError,

    /// Insufficient stock
    InsufficientStock,

    /// Wrong email or password
    AuthenticationFailed,

    /// Session lacks the role the action needs
    Forbidden,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            field_errors: None,
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a cart error.
    pub fn cart(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::CartError, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::AuthenticationFailed, message)
    }

    /// Turns a storage failure into `message` for the user.
    ///
    /// Not-found, duplicate, stock and cancelled-order errors keep their own
    /// wording; every other failure is logged and replaced by `message`.
    pub fn storage(message: &str, err: DbError) -> Self {
        match err {
            DbError::NotFound { .. }
            | DbError::UniqueViolation { .. }
            | DbError::InsufficientStock { .. }
            | DbError::OrderCancelled { .. } => ApiError::from(err),
            other => {
                error!(error = %other, "{}", message);
                ApiError::new(ErrorCode::DatabaseError, message)
            }
        }
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::InsufficientStock {
                product_id,
                requested,
            } => ApiError::new(
                ErrorCode::InsufficientStock,
                format!(
                    "Insufficient stock for product {}: {} requested",
                    product_id, requested
                ),
            ),
            DbError::OrderCancelled { .. } => {
                ApiError::new(ErrorCode::BusinessLogic, "Cancelled orders cannot be edited")
            }
            DbError::ConnectionFailed(e) => {
                error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::Serialization(e) => {
                error!("Stored record could not be decoded: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::ForeignKeyViolation { message } => {
                error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", id),
            CoreError::OrderNotFound(id) => ApiError::not_found("Order", id),
            CoreError::InsufficientStock {
                name,
                available,
                requested,
            } => ApiError::new(
                ErrorCode::InsufficientStock,
                format!(
                    "Only {} {} in stock ({} requested)",
                    available, name, requested
                ),
            ),
            e @ CoreError::InvalidStatusTransition { .. }
            | e @ CoreError::InvalidPaymentTransition { .. }
            | e @ CoreError::WrongCheckoutStep { .. } => {
                ApiError::new(ErrorCode::BusinessLogic, e.to_string())
            }
            CoreError::EmptyCart => ApiError::cart("Your cart is empty"),
            CoreError::CheckoutRejected(fields) => ApiError {
                code: ErrorCode::CheckoutInvalid,
                message: "Please correct the highlighted fields".to_string(),
                field_errors: Some(fields.to_map()),
            },
            CoreError::Validation(e) => ApiError::from(e),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Convenience type alias for handler results.
pub type ApiResult<T> = Result<T, ApiError>;
