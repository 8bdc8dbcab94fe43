//! # Checkout Module
//!
//! Field validation and the two-step checkout flow.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌──────────┐  submit_shipping ok   ┌─────────┐  submit_payment ok     │
//! │   │ Shipping │ ────────────────────► │ Payment │ ──────────────────►    │
//! │   └──────────┘ ◄──────────────────── └─────────┘        ┌───────────┐   │
//! │        │              back                │             │ Submitted │   │
//! │        │ errors                           │ errors      └───────────┘   │
//! │        ▼                                  ▼                             │
//! │   stay + FieldErrors               stay + FieldErrors                   │
//! │                                                                         │
//! │   Admin editing an existing order: payment fields are not checked.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every field is checked on its own and all failures are reported at once,
//! keyed by field.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::ShippingAddress;

// =============================================================================
// Field Patterns
// =============================================================================

static PERSON_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\s]{2,50}$").expect("name pattern is valid"));

pub(crate) static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

static POSTAL_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{5,10}$").expect("postal code pattern is valid"));

pub(crate) static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("phone pattern is valid"));

static CARD_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{16}$").expect("card number pattern is valid"));

static EXPIRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2}/[0-9]{2}$").expect("expiry pattern is valid"));

static CVV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{3,4}$").expect("cvv pattern is valid"));

// =============================================================================
// Field Errors
// =============================================================================

/// A form field that can fail checkout validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum CheckoutField {
    FirstName,
    LastName,
    Email,
    Address,
    City,
    PostalCode,
    Phone,
    CardNumber,
    ExpiryDate,
    Cvv,
}

impl CheckoutField {
    /// Wire name, matching the form's field keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutField::FirstName => "firstName",
            CheckoutField::LastName => "lastName",
            CheckoutField::Email => "email",
            CheckoutField::Address => "address",
            CheckoutField::City => "city",
            CheckoutField::PostalCode => "postalCode",
            CheckoutField::Phone => "phone",
            CheckoutField::CardNumber => "cardNumber",
            CheckoutField::ExpiryDate => "expiryDate",
            CheckoutField::Cvv => "cvv",
        }
    }
}

/// Validation failures keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FieldErrors(BTreeMap<CheckoutField, String>);

impl FieldErrors {
    pub fn insert(&mut self, field: CheckoutField, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: CheckoutField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: CheckoutField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CheckoutField, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }

    /// Field-name → message map for API payloads.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.iter()
            .map(|(f, m)| (f.as_str().to_string(), m.to_string()))
            .collect()
    }

    fn check(&mut self, ok: bool, field: CheckoutField, message: &str) {
        if !ok {
            self.insert(field, message);
        }
    }

    fn into_result(self) -> CoreResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CoreError::CheckoutRejected(self))
        }
    }
}

// =============================================================================
// Validators
// =============================================================================

/// Card details from the payment step. Never stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub card_number: String,
    /// MM/YY
    pub expiry_date: String,
    pub cvv: String,
}

/// Checks every shipping field and collects all failures.
///
/// ## Example
/// ```rust
/// use bazaar_core::checkout::{validate_shipping, CheckoutField};
/// use bazaar_core::types::ShippingAddress;
///
/// let mut address = ShippingAddress {
///     first_name: "Asha".into(),
///     last_name: "Rao".into(),
///     email: "asha@example.com".into(),
///     address: "12 MG Road".into(),
///     city: "Pune".into(),
///     postal_code: "411001".into(),
///     phone: "9876543210".into(),
/// };
/// assert!(validate_shipping(&address).is_empty());
///
/// address.postal_code = "12".into();
/// assert!(validate_shipping(&address).contains(CheckoutField::PostalCode));
/// ```
pub fn validate_shipping(address: &ShippingAddress) -> FieldErrors {
    let mut errors = FieldErrors::default();

    errors.check(
        PERSON_NAME.is_match(&address.first_name),
        CheckoutField::FirstName,
        "First name must be 2-50 characters",
    );
    errors.check(
        PERSON_NAME.is_match(&address.last_name),
        CheckoutField::LastName,
        "Last name must be 2-50 characters",
    );
    errors.check(
        EMAIL.is_match(&address.email),
        CheckoutField::Email,
        "Invalid email address",
    );
    errors.check(
        !address.address.trim().is_empty(),
        CheckoutField::Address,
        "Address is required",
    );
    errors.check(
        PERSON_NAME.is_match(&address.city),
        CheckoutField::City,
        "Invalid city name",
    );
    errors.check(
        POSTAL_CODE.is_match(&address.postal_code),
        CheckoutField::PostalCode,
        "Postal code must be 5-10 digits",
    );
    errors.check(
        PHONE.is_match(&address.phone),
        CheckoutField::Phone,
        "Phone must be 10 digits",
    );

    errors
}

/// Checks the card fields and collects all failures.
pub fn validate_payment(payment: &PaymentDetails) -> FieldErrors {
    let mut errors = FieldErrors::default();

    errors.check(
        CARD_NUMBER.is_match(&payment.card_number),
        CheckoutField::CardNumber,
        "Card number must be 16 digits",
    );
    errors.check(
        EXPIRY.is_match(&payment.expiry_date),
        CheckoutField::ExpiryDate,
        "Format: MM/YY",
    );
    errors.check(
        CVV.is_match(&payment.cvv),
        CheckoutField::Cvv,
        "CVV must be 3-4 digits",
    );

    errors
}

// =============================================================================
// Checkout Flow
// =============================================================================

/// Where the flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
    Shipping,
    Payment,
    Submitted,
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CheckoutStep::Shipping => "shipping",
            CheckoutStep::Payment => "payment",
            CheckoutStep::Submitted => "submitted",
        })
    }
}

/// What the checkout will produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum CheckoutMode {
    /// A fresh order from the user's cart.
    NewOrder,
    /// An admin rewriting an existing order; payment is not re-checked.
    AdminEdit {
        #[serde(rename = "orderId")]
        order_id: i64,
    },
}

impl CheckoutMode {
    pub fn skips_payment_validation(&self) -> bool {
        matches!(self, CheckoutMode::AdminEdit { .. })
    }
}

/// Both steps accepted; ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSubmission {
    pub mode: CheckoutMode,
    pub shipping: ShippingAddress,
}

/// Shipping → Payment → Submitted state machine.
///
/// Nothing is persisted here; the caller writes the order only after
/// [`CheckoutFlow::submit_payment`] returns a submission.
#[derive(Debug, Clone)]
pub struct CheckoutFlow {
    mode: CheckoutMode,
    step: CheckoutStep,
    shipping: Option<ShippingAddress>,
}

impl CheckoutFlow {
    pub fn new(mode: CheckoutMode) -> Self {
        CheckoutFlow {
            mode,
            step: CheckoutStep::Shipping,
            shipping: None,
        }
    }

    /// Starts on Shipping with `address` already filled in, as when an
    /// existing order is edited. The address is still validated on submit.
    pub fn prefilled(mode: CheckoutMode, address: ShippingAddress) -> Self {
        CheckoutFlow {
            mode,
            step: CheckoutStep::Shipping,
            shipping: Some(address),
        }
    }

    pub fn mode(&self) -> CheckoutMode {
        self.mode
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    /// Accepted shipping details, kept while stepping back and forth.
    pub fn shipping(&self) -> Option<&ShippingAddress> {
        self.shipping.as_ref()
    }

    /// Validates shipping; advances to Payment when every field passes.
    pub fn submit_shipping(&mut self, address: ShippingAddress) -> CoreResult<()> {
        self.expect_step(CheckoutStep::Shipping)?;
        validate_shipping(&address).into_result()?;

        self.shipping = Some(address);
        self.step = CheckoutStep::Payment;
        Ok(())
    }

    /// Returns from Payment to Shipping. No-op on the Shipping step.
    pub fn back(&mut self) -> CoreResult<()> {
        match self.step {
            CheckoutStep::Shipping => Ok(()),
            CheckoutStep::Payment => {
                self.step = CheckoutStep::Shipping;
                Ok(())
            }
            CheckoutStep::Submitted => Err(CoreError::WrongCheckoutStep {
                current: self.step,
                expected: CheckoutStep::Payment,
            }),
        }
    }

    /// Validates payment (skipped for admin edits) and finishes the flow.
    pub fn submit_payment(&mut self, payment: &PaymentDetails) -> CoreResult<CheckoutSubmission> {
        self.expect_step(CheckoutStep::Payment)?;

        if !self.mode.skips_payment_validation() {
            validate_payment(payment).into_result()?;
        }

        let shipping = self.shipping.clone().ok_or(CoreError::WrongCheckoutStep {
            current: CheckoutStep::Shipping,
            expected: CheckoutStep::Payment,
        })?;

        self.step = CheckoutStep::Submitted;
        Ok(CheckoutSubmission {
            mode: self.mode,
            shipping,
        })
    }

    fn expect_step(&self, expected: CheckoutStep) -> CoreResult<()> {
        if self.step == expected {
            Ok(())
        } else {
            Err(CoreError::WrongCheckoutStep {
                current: self.step,
                expected,
            })
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
