//! Payment ledger and status reconciliation
//!
//! The ledger is the source of truth for what has been paid: an append-only
//! sequence of signed entries per invoice, where refunds are new negative
//! entries rather than mutations of prior ones. [`reconcile`] recomputes an
//! invoice's canonical status and balances from the full entry history, so
//! the derived fields can never drift from the ledger no matter how writes
//! interleave.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use core_kernel::{InvoiceId, LedgerEntryId, Money};

use crate::error::InvoicingError;
use crate::invoice::InvoiceStatus;

/// Payment method tag
///
/// Stored as a free-text tag; unrecognized values deserialize to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Cash,
    Check,
    BankTransfer,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Check => "check",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Other => "other",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "card" => PaymentMethod::Card,
            "cash" => PaymentMethod::Cash,
            "check" => PaymentMethod::Check,
            "bank_transfer" => PaymentMethod::BankTransfer,
            _ => PaymentMethod::Other,
        })
    }
}

/// An append-only payment or refund record tied to one invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier
    pub id: LedgerEntryId,
    /// Owning invoice
    pub invoice_id: InvoiceId,
    /// Signed amount; negative entries represent refunds
    pub amount: Money,
    /// Payment method tag
    pub method: PaymentMethod,
    /// Free-form notes (refund entries carry the refund reason here)
    pub notes: Option<String>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Creates a payment entry; `amount` must already be validated positive
    pub fn payment(invoice_id: InvoiceId, amount: Money, method: PaymentMethod) -> Self {
        Self {
            id: LedgerEntryId::new_v7(),
            invoice_id,
            amount,
            method,
            notes: None,
            created_at: Utc::now(),
        }
    }

    /// Creates a refund entry recording the negation of `amount`
    ///
    /// `amount` is the positive refund value; the stored entry is negative so
    /// that summation alone reproduces the net paid position.
    pub fn refund(invoice_id: InvoiceId, amount: Money, reason: Option<String>) -> Self {
        Self {
            id: LedgerEntryId::new_v7(),
            invoice_id,
            amount: -amount,
            method: PaymentMethod::Other,
            notes: reason,
            created_at: Utc::now(),
        }
    }

    /// Attaches notes to the entry
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Returns true if this entry is a refund
    pub fn is_refund(&self) -> bool {
        self.amount.is_negative()
    }
}

/// A consistent snapshot derived from an invoice's full ledger history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    /// Canonical status implied by the ledger
    pub status: InvoiceStatus,
    /// Net ledger sum clamped to zero
    pub amount_paid: Money,
    /// Always `total_amount - amount_paid`
    pub amount_due: Money,
    /// Unclamped net ledger sum; negative when refunds exceed payments
    pub net_total: Money,
}

/// Recomputes an invoice's canonical status and balances from its ledger
///
/// This function is pure, idempotent, and order-independent with respect to
/// the entries: it reduces the ledger with commutative operations only, so
/// re-running it after any ledger mutation always yields the same consistent
/// snapshot regardless of how concurrent or retried writes were interleaved.
///
/// Status derivation:
/// - paid in full (clamped sum covers the total) takes precedence,
/// - a ledger containing refunds whose net sum is zero or below reads as
///   refunded,
/// - any other positive paid amount is a partial payment,
/// - otherwise the prior `pending`/`overdue` label is kept, defaulting to
///   `pending`.
///
/// # Errors
///
/// - `InvoicingError::Money` if an entry's currency disagrees with the
///   invoice total.
/// - `InvoicingError::LedgerIntegrity` if the net sum falls below the
///   negated total; the validated operations can never produce that, so it
///   signals corrupted data rather than a state to display.
pub fn reconcile(
    total_amount: Money,
    prior_status: InvoiceStatus,
    entries: &[LedgerEntry],
) -> Result<Reconciliation, InvoicingError> {
    let mut net_total = Money::zero(total_amount.currency());
    let mut has_refund = false;

    for entry in entries {
        net_total = net_total.checked_add(&entry.amount)?;
        if entry.is_refund() {
            has_refund = true;
        }
    }

    if net_total < -total_amount {
        return Err(InvoicingError::LedgerIntegrity(format!(
            "net ledger sum {} is below the refundable floor -{}",
            net_total, total_amount
        )));
    }

    let amount_paid = net_total.clamp_non_negative();
    let amount_due = total_amount.checked_sub(&amount_paid)?;

    let status = if amount_paid >= total_amount {
        InvoiceStatus::FullyPaid
    } else if has_refund && !net_total.is_positive() {
        InvoiceStatus::Refunded
    } else if amount_paid.is_positive() {
        InvoiceStatus::PartialPaid
    } else if matches!(prior_status, InvoiceStatus::Pending | InvoiceStatus::Overdue) {
        prior_status
    } else {
        InvoiceStatus::Pending
    };

    Ok(Reconciliation {
        status,
        amount_paid,
        amount_due,
        net_total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn usd(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::USD)
    }

    fn payment(amount: rust_decimal::Decimal) -> LedgerEntry {
        LedgerEntry::payment(InvoiceId::new(), usd(amount), PaymentMethod::Card)
    }

    fn refund(amount: rust_decimal::Decimal) -> LedgerEntry {
        LedgerEntry::refund(InvoiceId::new(), usd(amount), None)
    }

    #[test]
    fn test_empty_ledger_keeps_pending() {
        let rec = reconcile(usd(dec!(500)), InvoiceStatus::Pending, &[]).unwrap();

        assert_eq!(rec.status, InvoiceStatus::Pending);
        assert!(rec.amount_paid.is_zero());
        assert_eq!(rec.amount_due, usd(dec!(500)));
    }

    #[test]
    fn test_empty_ledger_keeps_overdue() {
        let rec = reconcile(usd(dec!(500)), InvoiceStatus::Overdue, &[]).unwrap();
        assert_eq!(rec.status, InvoiceStatus::Overdue);
    }

    #[test]
    fn test_partial_payment() {
        let entries = vec![payment(dec!(200))];
        let rec = reconcile(usd(dec!(500)), InvoiceStatus::Pending, &entries).unwrap();

        assert_eq!(rec.status, InvoiceStatus::PartialPaid);
        assert_eq!(rec.amount_paid, usd(dec!(200)));
        assert_eq!(rec.amount_due, usd(dec!(300)));
    }

    #[test]
    fn test_exact_payment_is_fully_paid() {
        let entries = vec![payment(dec!(500))];
        let rec = reconcile(usd(dec!(500)), InvoiceStatus::Pending, &entries).unwrap();

        assert_eq!(rec.status, InvoiceStatus::FullyPaid);
        assert!(rec.amount_due.is_zero());
    }

    #[test]
    fn test_two_installments_reach_fully_paid() {
        let entries = vec![payment(dec!(300)), payment(dec!(700))];
        let rec = reconcile(usd(dec!(1000)), InvoiceStatus::PartialPaid, &entries).unwrap();

        assert_eq!(rec.status, InvoiceStatus::FullyPaid);
        assert!(rec.amount_due.is_zero());
    }

    #[test]
    fn test_partial_refund_returns_to_partial_paid() {
        let entries = vec![payment(dec!(500)), refund(dec!(200))];
        let rec = reconcile(usd(dec!(500)), InvoiceStatus::FullyPaid, &entries).unwrap();

        assert_eq!(rec.status, InvoiceStatus::PartialPaid);
        assert_eq!(rec.amount_paid, usd(dec!(300)));
        assert_eq!(rec.amount_due, usd(dec!(200)));
    }

    #[test]
    fn test_full_refund_reads_refunded() {
        let entries = vec![payment(dec!(500)), refund(dec!(500))];
        let rec = reconcile(usd(dec!(500)), InvoiceStatus::FullyPaid, &entries).unwrap();

        assert_eq!(rec.status, InvoiceStatus::Refunded);
        assert!(rec.amount_paid.is_zero());
        assert_eq!(rec.amount_due, usd(dec!(500)));
        assert!(rec.net_total.is_zero());
    }

    #[test]
    fn test_net_negative_ledger_reads_refunded() {
        // Possible only through out-of-band data; clamped for display
        let entries = vec![payment(dec!(100)), refund(dec!(150))];
        let rec = reconcile(usd(dec!(500)), InvoiceStatus::PartialPaid, &entries).unwrap();

        assert_eq!(rec.status, InvoiceStatus::Refunded);
        assert!(rec.amount_paid.is_zero());
        assert_eq!(rec.amount_due, usd(dec!(500)));
        assert_eq!(rec.net_total, usd(dec!(-50)));
    }

    #[test]
    fn test_net_below_refundable_floor_is_integrity_error() {
        let entries = vec![refund(dec!(501))];
        let result = reconcile(usd(dec!(500)), InvoiceStatus::Pending, &entries);

        assert!(matches!(result, Err(InvoicingError::LedgerIntegrity(_))));
    }

    #[test]
    fn test_overpaid_ledger_is_fully_paid() {
        // Duplicate/retried writes can overshoot; status stays fully paid
        let entries = vec![payment(dec!(500)), payment(dec!(500))];
        let rec = reconcile(usd(dec!(500)), InvoiceStatus::Pending, &entries).unwrap();

        assert_eq!(rec.status, InvoiceStatus::FullyPaid);
        assert_eq!(rec.amount_paid, usd(dec!(1000)));
        assert_eq!(rec.amount_due, usd(dec!(-500)));
    }

    #[test]
    fn test_currency_mismatch_is_rejected() {
        let entries = vec![LedgerEntry::payment(
            InvoiceId::new(),
            Money::new(dec!(100), Currency::EUR),
            PaymentMethod::Card,
        )];
        let result = reconcile(usd(dec!(500)), InvoiceStatus::Pending, &entries);

        assert!(matches!(result, Err(InvoicingError::Money(_))));
    }

    #[test]
    fn test_refund_entry_is_negative() {
        let entry = refund(dec!(75));
        assert!(entry.is_refund());
        assert_eq!(entry.amount, usd(dec!(-75)));
    }

    #[test]
    fn test_method_round_trip_and_fallback() {
        for method in [
            PaymentMethod::Card,
            PaymentMethod::Cash,
            PaymentMethod::Check,
            PaymentMethod::BankTransfer,
            PaymentMethod::Other,
        ] {
            let parsed: PaymentMethod = method.as_str().parse().unwrap();
            assert_eq!(parsed, method);
        }

        let parsed: PaymentMethod = "venmo".parse().unwrap();
        assert_eq!(parsed, PaymentMethod::Other);
    }
}
