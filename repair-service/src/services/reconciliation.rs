//! Derivation of a job's balance and payment status from its financials.
//!
//! Amounts are stored as `f64` but all arithmetic happens in `Decimal` and
//! is rounded back to 2dp, so repeated payment deltas never drift.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{Financials, PaymentStatus};

const DECIMAL_PLACES: u32 = 2;

/// Input values should be checked with [`require_positive`] or
/// [`require_non_negative`] first. Non-finite input degrades to zero.
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

pub fn require_positive(field: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value <= 0.0 {
        return Err(format!("{} must be a positive number", field));
    }
    Ok(())
}

pub fn require_non_negative(field: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{} must be zero or a positive number", field));
    }
    Ok(())
}

/// Money is kept to whole cents. Finer values would be lost when the job
/// totals are rounded, leaving them out of step with the payments.
pub fn require_cents(field: &str, value: f64) -> Result<(), String> {
    let amount = to_decimal(value);
    if amount.round_dp(DECIMAL_PLACES) != amount {
        return Err(format!("{} must not have more than {} decimal places", field, DECIMAL_PLACES));
    }
    Ok(())
}

/// Result of applying the rule to one financials block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    pub balance_amount: f64,
    pub payment_status: PaymentStatus,
}

pub fn total_cost(financials: &Financials) -> Decimal {
    to_decimal(financials.repairing_charges) + to_decimal(financials.total_spare_cost)
        - to_decimal(financials.discount)
}

pub fn settle(financials: &Financials) -> Settlement {
    let received = to_decimal(financials.total_received);
    let balance = total_cost(financials) - received;

    let payment_status = if received > Decimal::ZERO && balance <= Decimal::ZERO {
        PaymentStatus::Paid
    } else if received > Decimal::ZERO {
        PaymentStatus::PartiallyPaid
    } else {
        PaymentStatus::Unpaid
    };

    Settlement {
        balance_amount: to_f64(balance),
        payment_status,
    }
}

/// Recompute the derived fields in place and return the new status.
pub fn recompute(financials: &mut Financials) -> PaymentStatus {
    let settlement = settle(financials);
    financials.balance_amount = settlement.balance_amount;
    settlement.payment_status
}

/// Add `delta` (negative when a payment shrinks) to the received total and
/// recompute.
pub fn apply_received_delta(financials: &mut Financials, delta: f64) -> PaymentStatus {
    let received = to_decimal(financials.total_received) + to_decimal(delta);
    financials.total_received = to_f64(received);
    recompute(financials)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_financials(charges: f64, spare: f64, discount: f64) -> Financials {
        let mut financials = Financials {
            repairing_charges: charges,
            total_spare_cost: spare,
            discount,
            ..Financials::default()
        };
        recompute(&mut financials);
        financials
    }

    #[test]
    fn fresh_job_is_unpaid_with_full_balance() {
        let financials = job_financials(1000.0, 200.0, 0.0);
        assert_eq!(financials.balance_amount, 1200.0);
        assert_eq!(settle(&financials).payment_status, PaymentStatus::Unpaid);
    }

    #[test]
    fn partial_then_full_payment() {
        let mut financials = job_financials(1000.0, 200.0, 0.0);

        let status = apply_received_delta(&mut financials, 500.0);
        assert_eq!(financials.total_received, 500.0);
        assert_eq!(financials.balance_amount, 700.0);
        assert_eq!(status, PaymentStatus::PartiallyPaid);

        let status = apply_received_delta(&mut financials, 700.0);
        assert_eq!(financials.total_received, 1200.0);
        assert_eq!(financials.balance_amount, 0.0);
        assert_eq!(status, PaymentStatus::Paid);
    }

    #[test]
    fn shrinking_a_payment_reopens_the_balance() {
        let mut financials = job_financials(1000.0, 200.0, 0.0);
        apply_received_delta(&mut financials, 500.0);
        apply_received_delta(&mut financials, 700.0);

        let status = apply_received_delta(&mut financials, 300.0 - 500.0);
        assert_eq!(financials.total_received, 1000.0);
        assert_eq!(financials.balance_amount, 200.0);
        assert_eq!(status, PaymentStatus::PartiallyPaid);
    }

    #[test]
    fn overpayment_is_paid_with_negative_balance() {
        let mut financials = job_financials(500.0, 0.0, 100.0);
        let status = apply_received_delta(&mut financials, 450.0);
        assert_eq!(financials.balance_amount, -50.0);
        assert_eq!(status, PaymentStatus::Paid);
    }

    #[test]
    fn zero_cost_job_without_payments_stays_unpaid() {
        let financials = job_financials(0.0, 0.0, 0.0);
        assert_eq!(financials.balance_amount, 0.0);
        assert_eq!(settle(&financials).payment_status, PaymentStatus::Unpaid);
    }

    #[test]
    fn cents_do_not_drift() {
        let mut financials = job_financials(0.3, 0.0, 0.0);
        apply_received_delta(&mut financials, 0.1);
        apply_received_delta(&mut financials, 0.2);
        assert_eq!(financials.total_received, 0.3);
        assert_eq!(financials.balance_amount, 0.0);
        assert_eq!(settle(&financials).payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn amount_guards() {
        assert!(require_positive("amount", 10.0).is_ok());
        assert!(require_positive("amount", 0.0).is_err());
        assert!(require_positive("amount", -5.0).is_err());
        assert!(require_positive("amount", f64::NAN).is_err());
        assert!(require_non_negative("discount", 0.0).is_ok());
        assert!(require_non_negative("discount", f64::INFINITY).is_err());
    }

    #[test]
    fn sub_cent_values_are_rejected() {
        assert!(require_cents("amount", 12.34).is_ok());
        assert!(require_cents("amount", 0.1).is_ok());
        assert!(require_cents("amount", 1500.0).is_ok());
        assert!(require_cents("amount", 0.004).is_err());
        assert!(require_cents("repairingCharges", 100.005).is_err());
    }
}
