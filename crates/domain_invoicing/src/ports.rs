//! Invoicing Domain Ports
//!
//! This module defines the port interfaces the invoicing domain needs from
//! the outside world, enabling swappable implementations:
//!
//! - **InvoiceStore / LedgerStore**: persistence (PostgreSQL in infra_db,
//!   in-memory in test_utils)
//! - **PaymentGateway**: executes monetary refunds with the processor that
//!   took the original payment
//! - **Mailer**: outbound email delivery (SMTP in infra_mail)
//!
//! Application services receive the ports as `Arc<dyn Trait>`; the choice of
//! adapter is made at startup.

use async_trait::async_trait;

use core_kernel::{DomainPort, InvoiceId, Money, PaymentToken, PortError, SessionId};

use crate::invoice::{Invoice, InvoiceStatus};
use crate::ledger::LedgerEntry;

/// Sort order for invoice listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvoiceSort {
    /// Newest first (default)
    #[default]
    IssuedDesc,
    /// Oldest first
    IssuedAsc,
    /// Soonest due first
    DueDateAsc,
}

/// Query parameters for listing invoices
#[derive(Debug, Clone, Default)]
pub struct InvoiceQuery {
    /// Filter by stored status
    pub status: Option<InvoiceStatus>,
    /// Filter by client email
    pub client_email: Option<String>,
    /// Filter by shoot session
    pub session_id: Option<SessionId>,
    /// Sort order
    pub sort: InvoiceSort,
    /// Limit results
    pub limit: Option<u32>,
    /// Offset for pagination
    pub offset: Option<u32>,
}

impl InvoiceQuery {
    /// Creates a query filtering by status
    pub fn by_status(status: InvoiceStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Creates a query filtering by client email
    pub fn by_client_email(email: impl Into<String>) -> Self {
        Self {
            client_email: Some(email.into()),
            ..Default::default()
        }
    }

    /// Creates a query filtering by session
    pub fn for_session(session_id: SessionId) -> Self {
        Self {
            session_id: Some(session_id),
            ..Default::default()
        }
    }

    /// Sets the sort order
    pub fn sorted(mut self, sort: InvoiceSort) -> Self {
        self.sort = sort;
        self
    }

    /// Adds pagination to the query
    pub fn paginate(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }
}

/// Persistence port for invoice records
#[async_trait]
pub trait InvoiceStore: DomainPort {
    /// Inserts a newly created invoice
    async fn insert(&self, invoice: &Invoice) -> Result<(), PortError>;

    /// Fetches an invoice by id
    async fn fetch(&self, id: InvoiceId) -> Result<Invoice, PortError>;

    /// Fetches an invoice by its public payment token
    async fn fetch_by_token(&self, token: &PaymentToken) -> Result<Invoice, PortError>;

    /// Persists the derived fields (amounts, status, paid_at, updated_at)
    /// as a single atomic record update
    async fn update_derived(&self, invoice: &Invoice) -> Result<(), PortError>;

    /// Lists invoices matching the query
    async fn list(&self, query: &InvoiceQuery) -> Result<Vec<Invoice>, PortError>;
}

/// Persistence port for the append-only payment ledger
#[async_trait]
pub trait LedgerStore: DomainPort {
    /// Appends an entry; entries are never updated or deleted
    async fn append(&self, entry: &LedgerEntry) -> Result<(), PortError>;

    /// Returns every entry recorded for the invoice
    async fn entries_for_invoice(&self, invoice_id: InvoiceId) -> Result<Vec<LedgerEntry>, PortError>;
}

/// Port to the external payment processor
///
/// Only the refund leg is consumed by the core; charges happen on the public
/// payment page, outside this system.
#[async_trait]
pub trait PaymentGateway: DomainPort {
    /// Executes a monetary refund
    ///
    /// `reference` ties the refund back to the original payment (the invoice
    /// number is used as the stable reference).
    async fn refund(&self, amount: Money, reference: &str) -> Result<(), PortError>;
}

/// Outbound email port
#[async_trait]
pub trait Mailer: DomainPort {
    /// Sends a single HTML email
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), PortError>;
}
