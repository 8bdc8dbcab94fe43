//! # Validation Module
//!
//! Input validation for products, accounts and cart actions.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Browser form                                                  │
//! │  └── Immediate per-field feedback                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Command handler (Rust)                                       │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE email                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Checkout fields are validated separately in [`crate::checkout`], where
//! every failure is collected; the validators here stop at the first one.
//!
//! ## Usage
//! ```rust
//! use bazaar_core::validation::{parse_price, validate_add_quantity};
//!
//! assert_eq!(parse_price("99.99").unwrap(), 99.99);
//! assert!(parse_price("9.999").is_err());
//! assert!(validate_add_quantity(1000).is_err());
//! ```

use regex::Regex;
use std::sync::LazyLock;

use crate::checkout::{EMAIL, PHONE};
use crate::error::ValidationError;
use crate::types::{Country, NewProduct, NewUser, ProductDraft, ProductPatch, UserPatch};
use crate::{MAX_ADD_QUANTITY, MAX_DISCOUNT_PERCENTAGE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

static ACCOUNT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\s]{3,50}$").expect("account name pattern is valid"));

static PRICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(\.[0-9]{1,2})?$").expect("price pattern is valid"));

/// Special characters a password must draw at least one from.
pub const PASSWORD_SPECIALS: &str = "@$!%*?&";

fn required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn char_len_between(field: &str, value: &str, min: usize, max: usize) -> ValidationResult<()> {
    let len = value.chars().count();
    if len < min {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min,
        });
    }
    if len > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

// =============================================================================
// Product Validators
// =============================================================================

/// Product name: 3 to 100 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    required("name", name)?;
    char_len_between("name", name, 3, 100)
}

/// Product description: 10 to 1000 characters.
pub fn validate_description(description: &str) -> ValidationResult<()> {
    required("description", description)?;
    char_len_between("description", description, 10, 1000)
}

/// Parses a typed price: digits with at most two decimals, greater than 0.
///
/// ## Example
/// ```rust
/// use bazaar_core::validation::parse_price;
///
/// assert_eq!(parse_price("250").unwrap(), 250.0);
/// assert!(parse_price("0").is_err());
/// assert!(parse_price("-5").is_err());
/// assert!(parse_price("").is_err());
/// ```
pub fn parse_price(text: &str) -> ValidationResult<f64> {
    let text = text.trim();
    required("price", text)?;

    if !PRICE.is_match(text) {
        return Err(ValidationError::InvalidFormat {
            field: "price".to_string(),
            reason: "enter a valid price (e.g. 99.99)".to_string(),
        });
    }

    let price: f64 = text.parse().map_err(|_| ValidationError::InvalidFormat {
        field: "price".to_string(),
        reason: "enter a valid price (e.g. 99.99)".to_string(),
    })?;

    validate_price(price)?;
    Ok(price)
}

/// Numeric price from an edit form: finite and greater than 0.
pub fn validate_price(price: f64) -> ValidationResult<()> {
    if !price.is_finite() || price <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }
    Ok(())
}

/// Stock level: whole, not negative.
pub fn validate_stock_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity < 0 {
        return Err(ValidationError::Negative {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Discount: 0 to 90 percent.
pub fn validate_discount(discount: f64) -> ValidationResult<()> {
    if !discount.is_finite() || !(0.0..=MAX_DISCOUNT_PERCENTAGE).contains(&discount) {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: MAX_DISCOUNT_PERCENTAGE as i64,
        });
    }
    Ok(())
}

/// Parses a country form value.
pub fn parse_country(value: &str) -> ValidationResult<Country> {
    required("country", value)?;
    value.parse().map_err(|_| ValidationError::NotAllowed {
        field: "country".to_string(),
        allowed: Country::ALL.iter().map(|c| c.to_string()).collect(),
    })
}

/// Validates an "add product" form and turns it into a draft.
pub fn validate_new_product(
    product: &NewProduct,
    owner_id: Option<i64>,
) -> ValidationResult<ProductDraft> {
    validate_product_name(&product.name)?;
    let price = parse_price(&product.price)?;
    validate_stock_quantity(product.quantity)?;
    validate_description(&product.description)?;
    validate_discount(product.discount_percentage)?;
    let country = parse_country(&product.country)?;

    Ok(ProductDraft {
        owner_id,
        name: product.name.trim().to_string(),
        description: product.description.trim().to_string(),
        price,
        discount_percentage: product.discount_percentage,
        quantity: product.quantity,
        category: product.category.trim().to_string(),
        country,
        image: product.image.clone().filter(|i| !i.trim().is_empty()),
    })
}

/// Validates only the fields an edit actually sets.
pub fn validate_product_patch(patch: &ProductPatch) -> ValidationResult<()> {
    if let Some(name) = &patch.name {
        validate_product_name(name)?;
    }
    if let Some(description) = &patch.description {
        validate_description(description)?;
    }
    if let Some(price) = patch.price {
        validate_price(price)?;
    }
    if let Some(discount) = patch.discount_percentage {
        validate_discount(discount)?;
    }
    if let Some(quantity) = patch.quantity {
        validate_stock_quantity(quantity)?;
    }
    Ok(())
}

// =============================================================================
// Cart Validators
// =============================================================================

/// Units per add-to-cart action: 1 to [`MAX_ADD_QUANTITY`].
pub fn validate_add_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if quantity > MAX_ADD_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ADD_QUANTITY,
        });
    }

    Ok(())
}

/// Trims a search query; at most 100 characters.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Account Validators
// =============================================================================

/// Account holder name: 3 to 50 letters or spaces.
pub fn validate_account_name(name: &str) -> ValidationResult<()> {
    required("name", name)?;
    if !ACCOUNT_NAME.is_match(name) {
        return Err(ValidationError::InvalidFormat {
            field: "name".to_string(),
            reason: "must be 3-50 characters and contain only letters".to_string(),
        });
    }
    Ok(())
}

pub fn validate_email(email: &str) -> ValidationResult<()> {
    required("email", email)?;
    if !EMAIL.is_match(email) {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "please enter a valid email address".to_string(),
        });
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    required("phone", phone)?;
    if !PHONE.is_match(phone) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must be exactly 10 digits".to_string(),
        });
    }
    Ok(())
}

pub fn validate_age(age: i64) -> ValidationResult<()> {
    if !(1..=120).contains(&age) {
        return Err(ValidationError::OutOfRange {
            field: "age".to_string(),
            min: 1,
            max: 120,
        });
    }
    Ok(())
}

/// Password strength.
///
/// ## Rules
/// - At least 8 characters, drawn from letters, digits and `@$!%*?&`
/// - At least one lowercase, one uppercase, one digit, one special
pub fn validate_password(password: &str) -> ValidationResult<()> {
    required("password", password)?;

    let allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c));
    let strong = password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c));

    if !(allowed && strong) {
        return Err(ValidationError::InvalidFormat {
            field: "password".to_string(),
            reason: "must be at least 8 characters with uppercase, lowercase, number, and special character".to_string(),
        });
    }
    Ok(())
}

/// Validates a registration form; returns the parsed country.
pub fn validate_registration(user: &NewUser) -> ValidationResult<Country> {
    validate_account_name(&user.name)?;
    validate_email(&user.email)?;
    validate_phone(&user.phone)?;
    validate_age(user.age)?;
    validate_password(&user.password)?;
    parse_country(&user.country)
}

/// Validates only the fields an admin edit sets.
pub fn validate_user_patch(patch: &UserPatch) -> ValidationResult<()> {
    if let Some(name) = &patch.name {
        validate_account_name(name)?;
    }
    if let Some(phone) = &patch.phone {
        validate_phone(phone)?;
    }
    if let Some(age) = patch.age {
        validate_age(age)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
