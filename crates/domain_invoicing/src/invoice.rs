//! Invoice management
//!
//! This module defines the invoice entity for studio billing. An invoice's
//! `amount_paid`, `amount_due`, and `status` are derived state: they are only
//! ever written by applying a [`Reconciliation`](crate::ledger::Reconciliation)
//! computed from the full payment ledger, never assigned directly.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use core_kernel::{InvoiceId, Money, PaymentToken, ServiceId, SessionId};

use crate::error::InvoicingError;
use crate::ledger::Reconciliation;

/// Invoice status
///
/// `Overdue` is a display label derived from the due date; the reconciliation
/// engine never produces it on its own. `Voided` is an administrative
/// terminal state outside the payment flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Awaiting first payment
    Pending,
    /// Some payment received, balance outstanding
    PartialPaid,
    /// Paid in full
    FullyPaid,
    /// Past due date without full payment
    Overdue,
    /// Administratively cancelled
    Voided,
    /// Net ledger wiped out by refunds
    Refunded,
}

impl InvoiceStatus {
    /// Returns the canonical storage tag for this status
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::PartialPaid => "partial_paid",
            InvoiceStatus::FullyPaid => "fully_paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Voided => "voided",
            InvoiceStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvoiceStatus::Pending),
            "partial_paid" => Ok(InvoiceStatus::PartialPaid),
            "fully_paid" => Ok(InvoiceStatus::FullyPaid),
            "overdue" => Ok(InvoiceStatus::Overdue),
            "voided" => Ok(InvoiceStatus::Voided),
            "refunded" => Ok(InvoiceStatus::Refunded),
            other => Err(ParseFieldError::new("invoice status", other)),
        }
    }
}

/// Payment policy selected at invoice creation; never changes afterward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// The full total is due up front
    Full,
    /// An initial installment is due; the remainder follows
    Partial,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Full => "full",
            PaymentType::Partial => "partial",
        }
    }
}

impl FromStr for PaymentType {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(PaymentType::Full),
            "partial" => Ok(PaymentType::Partial),
            other => Err(ParseFieldError::new("payment type", other)),
        }
    }
}

/// Error parsing a stored enum tag
#[derive(Debug, Error)]
#[error("Unknown {field}: {value}")]
pub struct ParseFieldError {
    field: &'static str,
    value: String,
}

impl ParseFieldError {
    fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// Input for creating a new invoice
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub client_name: String,
    pub client_email: String,
    pub title: String,
    pub notes: Option<String>,
    pub total_amount: Money,
    pub payment_type: PaymentType,
    /// Required when `payment_type` is `Partial`; must be absent for `Full`
    pub partial_amount: Option<Money>,
    pub due_date: Option<NaiveDate>,
    pub session_id: Option<SessionId>,
    pub service_id: Option<ServiceId>,
}

/// An invoice for studio services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier
    pub id: InvoiceId,
    /// Invoice number (human-readable, unique)
    pub invoice_number: String,
    /// Client display name
    pub client_name: String,
    /// Client email address for notifications
    pub client_email: String,
    /// Short description of the billed work
    pub title: String,
    /// Free-form notes
    pub notes: Option<String>,
    /// Total billed amount; immutable after creation
    pub total_amount: Money,
    /// Payment policy selected at creation
    pub payment_type: PaymentType,
    /// Initial installment when the policy is partial
    pub partial_amount: Option<Money>,
    /// Derived: clamped net sum of the payment ledger
    pub amount_paid: Money,
    /// Derived: always `total_amount - amount_paid`
    pub amount_due: Money,
    /// Derived status
    pub status: InvoiceStatus,
    /// Bearer secret for the public payment page
    pub payment_token: PaymentToken,
    /// Optional payment deadline
    pub due_date: Option<NaiveDate>,
    /// When the invoice was issued
    pub issued_at: DateTime<Utc>,
    /// When the invoice first reached fully paid
    pub paid_at: Option<DateTime<Utc>>,
    /// Shoot session this invoice settles, if any; downstream gallery access
    /// gates on this invoice's paid state
    pub session_id: Option<SessionId>,
    /// Service package reference
    pub service_id: Option<ServiceId>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Creates a new invoice in the pending state
    ///
    /// Validates the creation input, generates the invoice number and the
    /// payment token. The initial `amount_due` is the full total for the
    /// `full` policy and the first installment for `partial`; once the first
    /// ledger entry lands, reconciliation takes over the derived fields.
    ///
    /// # Errors
    ///
    /// Returns `InvoicingError::Validation` if required fields are missing
    /// or the amounts violate the creation rules.
    pub fn new(input: NewInvoice) -> Result<Self, InvoicingError> {
        if input.client_name.trim().is_empty() {
            return Err(InvoicingError::validation("client_name is required"));
        }
        if input.client_email.trim().is_empty() || !input.client_email.contains('@') {
            return Err(InvoicingError::validation(
                "client_email must be a valid email address",
            ));
        }
        if input.title.trim().is_empty() {
            return Err(InvoicingError::validation("title is required"));
        }
        if !input.total_amount.is_positive() {
            return Err(InvoicingError::validation(
                "total_amount must be greater than zero",
            ));
        }

        let amount_due = match (input.payment_type, input.partial_amount) {
            (PaymentType::Full, None) => input.total_amount,
            (PaymentType::Full, Some(_)) => {
                return Err(InvoicingError::validation(
                    "partial_amount is only valid for partial invoices",
                ));
            }
            (PaymentType::Partial, None) => {
                return Err(InvoicingError::validation(
                    "partial_amount is required for partial invoices",
                ));
            }
            (PaymentType::Partial, Some(partial)) => {
                if partial.currency() != input.total_amount.currency() {
                    return Err(InvoicingError::validation(
                        "partial_amount currency must match total_amount",
                    ));
                }
                if !partial.is_positive() || partial > input.total_amount {
                    return Err(InvoicingError::validation(
                        "partial_amount must be greater than zero and at most total_amount",
                    ));
                }
                partial
            }
        };

        let now = Utc::now();

        Ok(Self {
            id: InvoiceId::new_v7(),
            invoice_number: generate_invoice_number(),
            client_name: input.client_name,
            client_email: input.client_email,
            title: input.title,
            notes: input.notes,
            total_amount: input.total_amount,
            payment_type: input.payment_type,
            partial_amount: input.partial_amount,
            amount_paid: Money::zero(input.total_amount.currency()),
            amount_due,
            status: InvoiceStatus::Pending,
            payment_token: PaymentToken::generate(),
            due_date: input.due_date,
            issued_at: now,
            paid_at: None,
            session_id: input.session_id,
            service_id: input.service_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a reconciliation snapshot to the cached derived fields
    ///
    /// Stamps `paid_at` on the first transition into fully paid; the stamp is
    /// kept even if a later refund moves the status away again.
    pub fn apply_reconciliation(&mut self, reconciliation: &Reconciliation, now: DateTime<Utc>) {
        self.amount_paid = reconciliation.amount_paid;
        self.amount_due = reconciliation.amount_due;
        self.status = reconciliation.status;

        if reconciliation.status == InvoiceStatus::FullyPaid && self.paid_at.is_none() {
            self.paid_at = Some(now);
        }

        self.updated_at = now;
    }

    /// Administratively voids the invoice
    ///
    /// This is the one status write that bypasses reconciliation; voided is a
    /// terminal state outside the payment flow and voided invoices reject
    /// further payments and refunds.
    pub fn void(&mut self, now: DateTime<Utc>) {
        self.status = InvoiceStatus::Voided;
        self.updated_at = now;
    }

    /// Returns true if the invoice has been administratively voided
    pub fn is_voided(&self) -> bool {
        self.status == InvoiceStatus::Voided
    }

    /// Checks if the invoice is past its due date without full payment
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.due_date {
            Some(due) => {
                today > due
                    && matches!(
                        self.status,
                        InvoiceStatus::Pending | InvoiceStatus::PartialPaid
                    )
            }
            None => false,
        }
    }

    /// Returns the status to display, substituting `Overdue` for unpaid
    /// invoices past their due date
    pub fn display_status(&self, today: NaiveDate) -> InvoiceStatus {
        if self.is_overdue(today) {
            InvoiceStatus::Overdue
        } else {
            self.status
        }
    }
}

/// Generates a unique invoice number
fn generate_invoice_number() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("INV-{}", duration.as_millis() % 10_000_000_000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn base_input() -> NewInvoice {
        NewInvoice {
            client_name: "Avery Lane".to_string(),
            client_email: "avery@example.com".to_string(),
            title: "Engagement session".to_string(),
            notes: None,
            total_amount: Money::new(dec!(1000), Currency::USD),
            payment_type: PaymentType::Full,
            partial_amount: None,
            due_date: None,
            session_id: None,
            service_id: None,
        }
    }

    #[test]
    fn test_new_full_invoice() {
        let invoice = Invoice::new(base_input()).unwrap();

        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert!(invoice.invoice_number.starts_with("INV-"));
        assert!(invoice.amount_paid.is_zero());
        assert_eq!(invoice.amount_due, invoice.total_amount);
        assert!(invoice.paid_at.is_none());
    }

    #[test]
    fn test_new_partial_invoice_due_is_installment() {
        let mut input = base_input();
        input.payment_type = PaymentType::Partial;
        input.partial_amount = Some(Money::new(dec!(300), Currency::USD));

        let invoice = Invoice::new(input).unwrap();

        assert_eq!(invoice.amount_due.amount(), dec!(300));
        assert_eq!(invoice.total_amount.amount(), dec!(1000));
        assert_eq!(invoice.status, InvoiceStatus::Pending);
    }

    #[test]
    fn test_new_rejects_missing_fields() {
        let mut input = base_input();
        input.client_email = "not-an-email".to_string();
        assert!(matches!(
            Invoice::new(input),
            Err(InvoicingError::Validation(_))
        ));

        let mut input = base_input();
        input.title = "  ".to_string();
        assert!(Invoice::new(input).is_err());
    }

    #[test]
    fn test_new_rejects_non_positive_total() {
        let mut input = base_input();
        input.total_amount = Money::zero(Currency::USD);
        assert!(Invoice::new(input).is_err());
    }

    #[test]
    fn test_new_rejects_partial_without_amount() {
        let mut input = base_input();
        input.payment_type = PaymentType::Partial;
        assert!(Invoice::new(input).is_err());
    }

    #[test]
    fn test_new_rejects_partial_above_total() {
        let mut input = base_input();
        input.payment_type = PaymentType::Partial;
        input.partial_amount = Some(Money::new(dec!(1001), Currency::USD));
        assert!(Invoice::new(input).is_err());
    }

    #[test]
    fn test_new_rejects_partial_amount_on_full_invoice() {
        let mut input = base_input();
        input.partial_amount = Some(Money::new(dec!(100), Currency::USD));
        assert!(Invoice::new(input).is_err());
    }

    #[test]
    fn test_tokens_differ_between_invoices() {
        let a = Invoice::new(base_input()).unwrap();
        let b = Invoice::new(base_input()).unwrap();
        assert_ne!(a.payment_token, b.payment_token);
    }

    #[test]
    fn test_overdue_display() {
        let mut input = base_input();
        input.due_date = NaiveDate::from_ymd_opt(2024, 1, 31);
        let invoice = Invoice::new(input).unwrap();

        let before = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let after = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();

        assert_eq!(invoice.display_status(before), InvoiceStatus::Pending);
        assert_eq!(invoice.display_status(after), InvoiceStatus::Overdue);
    }

    #[test]
    fn test_voided_invoice_is_never_overdue() {
        let mut input = base_input();
        input.due_date = NaiveDate::from_ymd_opt(2020, 1, 1);
        let mut invoice = Invoice::new(input).unwrap();
        invoice.void(Utc::now());

        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(!invoice.is_overdue(today));
        assert_eq!(invoice.display_status(today), InvoiceStatus::Voided);
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            InvoiceStatus::Pending,
            InvoiceStatus::PartialPaid,
            InvoiceStatus::FullyPaid,
            InvoiceStatus::Overdue,
            InvoiceStatus::Voided,
            InvoiceStatus::Refunded,
        ] {
            let parsed: InvoiceStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("paid".parse::<InvoiceStatus>().is_err());
    }
}
