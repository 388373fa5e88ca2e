//! Invoicing domain errors

use core_kernel::{InvoiceId, Money, MoneyError, PortError};
use thiserror::Error;

/// Errors that can occur in the invoicing domain
#[derive(Debug, Error)]
pub enum InvoicingError {
    /// Input failed validation; nothing was mutated
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invoice not found
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    /// Payment amount outside the payable range
    #[error("Amount {amount} is outside the payable range (0, {amount_due}]")]
    AmountOutOfRange { amount: Money, amount_due: Money },

    /// Refund amount exceeds what has been paid
    #[error("Refund {amount} exceeds recorded payments {amount_paid}")]
    RefundExceedsPayments { amount: Money, amount_paid: Money },

    /// Operation not allowed in the invoice's current state
    #[error("Invoice {0} is voided and cannot accept payments or refunds")]
    InvoiceVoided(InvoiceId),

    /// The ledger contains data that the validated operations can never produce
    #[error("Ledger integrity violation: {0}")]
    LedgerIntegrity(String),

    /// The payment gateway rejected or failed the monetary operation
    #[error("Payment gateway failure: {0}")]
    Gateway(String),

    /// Money arithmetic error (currency mismatch between ledger and invoice)
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    /// Underlying store or adapter failure
    #[error("Store error: {0}")]
    Store(#[from] PortError),
}

impl InvoicingError {
    pub fn validation(message: impl Into<String>) -> Self {
        InvoicingError::Validation(message.into())
    }

    /// Returns true if the underlying store reported the invoice missing
    pub fn is_not_found(&self) -> bool {
        match self {
            InvoicingError::InvoiceNotFound(_) => true,
            InvoicingError::Store(port) => port.is_not_found(),
            _ => false,
        }
    }
}
