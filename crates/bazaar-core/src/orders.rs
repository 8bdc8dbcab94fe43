//! # Order Lifecycle
//!
//! Transition rules for order and payment status.
//!
//! ## Order Status
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   pending ──► confirmed ──► processing ──► shipped ──► delivered        │
//! │      │            │              │            │                         │
//! │      └────────────┴──────────────┴────────────┴──────► cancelled        │
//! │                                                                         │
//! │   Forward moves may skip steps (confirmed → shipped).                   │
//! │   Delivered and cancelled are final.                                    │
//! │   Re-applying the current status is a no-op.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Payment Status
//! `pending → paid`, `pending → refunded`, `paid → refunded`. Refunded is
//! final.

use crate::error::{CoreError, CoreResult};
use crate::types::{OrderStatus, PaymentStatus};

/// Outcome of a permitted status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The target equals the current status; nothing to write.
    Unchanged,
    /// The status moves.
    Changed,
}

/// Whether `from → to` is in the order transition table.
///
/// Same-status pairs count as allowed.
pub fn order_transition_allowed(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;

    if from == to {
        return true;
    }

    match (from, to) {
        (Delivered | Cancelled, _) => false,
        (_, Cancelled) => true,
        // Forward only, along declaration order.
        (_, Pending) => false,
        (from, to) => to > from,
    }
}

/// Checks an order status change against the transition table.
///
/// ## Example
/// ```rust
/// use bazaar_core::orders::{check_order_transition, Transition};
/// use bazaar_core::OrderStatus;
///
/// let t = check_order_transition(OrderStatus::Confirmed, OrderStatus::Shipped).unwrap();
/// assert_eq!(t, Transition::Changed);
///
/// assert!(check_order_transition(OrderStatus::Delivered, OrderStatus::Pending).is_err());
/// ```
pub fn check_order_transition(from: OrderStatus, to: OrderStatus) -> CoreResult<Transition> {
    if !order_transition_allowed(from, to) {
        return Err(CoreError::InvalidStatusTransition { from, to });
    }
    Ok(if from == to {
        Transition::Unchanged
    } else {
        Transition::Changed
    })
}

/// Whether `from → to` is an allowed payment status change.
pub fn payment_transition_allowed(from: PaymentStatus, to: PaymentStatus) -> bool {
    use PaymentStatus::*;

    matches!(
        (from, to),
        (Pending, Pending)
            | (Paid, Paid)
            | (Refunded, Refunded)
            | (Pending, Paid)
            | (Pending, Refunded)
            | (Paid, Refunded)
    )
}

/// Checks a payment status change.
pub fn check_payment_transition(from: PaymentStatus, to: PaymentStatus) -> CoreResult<Transition> {
    if !payment_transition_allowed(from, to) {
        return Err(CoreError::InvalidPaymentTransition { from, to });
    }
    Ok(if from == to {
        Transition::Unchanged
    } else {
        Transition::Changed
    })
}

/// Whether the "Mark as shipped" action applies to an order in `status`.
pub fn can_mark_shipped(status: OrderStatus) -> bool {
    status != OrderStatus::Shipped && order_transition_allowed(status, OrderStatus::Shipped)
}

/// Whether moving into `to` returns the order's items to stock.
pub fn restocks_on(from: OrderStatus, to: OrderStatus) -> bool {
    to == OrderStatus::Cancelled && from != OrderStatus::Cancelled
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn test_forward_moves_allowed() {
        assert!(order_transition_allowed(Pending, Confirmed));
        assert!(order_transition_allowed(Confirmed, Processing));
        assert!(order_transition_allowed(Processing, Shipped));
        assert!(order_transition_allowed(Shipped, Delivered));
        // Skips.
        assert!(order_transition_allowed(Confirmed, Shipped));
        assert!(order_transition_allowed(Pending, Delivered));
    }

    #[test]
    fn test_backward_moves_rejected() {
        assert!(!order_transition_allowed(Delivered, Pending));
        assert!(!order_transition_allowed(Shipped, Processing));
        assert!(!order_transition_allowed(Confirmed, Pending));

        let err = check_order_transition(Delivered, Pending).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidStatusTransition {
                from: Delivered,
                to: Pending
            }
        ));
    }

    #[test]
    fn test_cancellation_rules() {
        for from in [Pending, Confirmed, Processing, Shipped] {
            assert!(order_transition_allowed(from, Cancelled), "{from} → cancelled");
        }
        assert!(!order_transition_allowed(Delivered, Cancelled));
        assert!(!order_transition_allowed(Cancelled, Confirmed));
    }

    #[test]
    fn test_same_status_is_noop() {
        for status in OrderStatus::ALL {
            assert_eq!(
                check_order_transition(status, status).unwrap(),
                Transition::Unchanged
            );
        }
    }

    #[test]
    fn test_payment_transitions() {
        use PaymentStatus as P;

        assert_eq!(
            check_payment_transition(P::Pending, P::Paid).unwrap(),
            Transition::Changed
        );
        assert!(payment_transition_allowed(P::Paid, P::Refunded));
        assert!(payment_transition_allowed(P::Pending, P::Refunded));
        assert!(!payment_transition_allowed(P::Refunded, P::Paid));
        assert!(!payment_transition_allowed(P::Paid, P::Pending));
        assert_eq!(
            check_payment_transition(P::Refunded, P::Refunded).unwrap(),
            Transition::Unchanged
        );
    }

    #[test]
    fn test_mark_shipped_availability() {
        assert!(can_mark_shipped(Confirmed));
        assert!(can_mark_shipped(Processing));
        assert!(!can_mark_shipped(Shipped));
        assert!(!can_mark_shipped(Delivered));
        assert!(!can_mark_shipped(Cancelled));
    }

    #[test]
    fn test_restock_only_on_entering_cancelled() {
        assert!(restocks_on(Confirmed, Cancelled));
        assert!(!restocks_on(Cancelled, Cancelled));
        assert!(!restocks_on(Confirmed, Shipped));
    }
}
