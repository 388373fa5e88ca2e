//! Invoicing Domain - Invoice Lifecycle and Payment Reconciliation
//!
//! This crate implements the billing core for the studio: creating invoices,
//! accepting full or partial payments, refunding, and deriving each
//! invoice's canonical status from its payment ledger.
//!
//! # Reconciliation Principle
//!
//! Status is never a separately maintained flag. Every state change is a
//! side effect of an append-only ledger write followed by
//! [`ledger::reconcile`], which recomputes `(status, amount_paid,
//! amount_due)` from the full entry history. Summation is commutative, so
//! the derived snapshot is identical under any interleaving or replay of
//! writes.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_invoicing::{InvoicingService, NewInvoice, PaymentMethod};
//!
//! let outcome = service.create_invoice(new_invoice).await?;
//! let paid = service
//!     .record_payment(outcome.invoice.id, amount, PaymentMethod::Card, None)
//!     .await?;
//! assert!(paid.invoice.amount_paid.is_positive());
//! ```

pub mod error;
pub mod invoice;
pub mod ledger;
pub mod notify;
pub mod ports;
pub mod service;

pub use error::InvoicingError;
pub use invoice::{Invoice, InvoiceStatus, NewInvoice, PaymentType};
pub use ledger::{reconcile, LedgerEntry, PaymentMethod, Reconciliation};
pub use notify::{InvoiceEvent, NotificationDispatcher, NotificationOutcome};
pub use ports::{InvoiceQuery, InvoiceSort, InvoiceStore, LedgerStore, Mailer, PaymentGateway};
pub use service::{
    CreateInvoiceOutcome, InvoicingService, PaymentLinkOutcome, RecordPaymentOutcome,
    RefundOutcome, ServiceConfig,
};
