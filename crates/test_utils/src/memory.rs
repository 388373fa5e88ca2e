//! In-memory port implementations
//!
//! Adapters backing the domain ports with plain process memory, used by the
//! service-level tests. The stores can be told to fail their next call so
//! tests can exercise the fail-closed paths, and the mailer records every
//! send so tests can assert on notification content.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use core_kernel::{DomainPort, InvoiceId, Money, PaymentToken, PortError};
use domain_invoicing::ports::{InvoiceQuery, InvoiceSort, InvoiceStore, LedgerStore, Mailer, PaymentGateway};
use domain_invoicing::{Invoice, LedgerEntry};

/// In-memory invoice store
#[derive(Default)]
pub struct InMemoryInvoiceStore {
    invoices: Mutex<HashMap<InvoiceId, Invoice>>,
    fail_next: AtomicBool,
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next store call fail with a connection error
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn check_failure(&self) -> Result<(), PortError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(PortError::connection("simulated store outage"));
        }
        Ok(())
    }

    /// Returns the stored record, bypassing the service's read reconciliation
    pub fn stored(&self, id: InvoiceId) -> Option<Invoice> {
        self.invoices.lock().unwrap().get(&id).cloned()
    }
}

impl DomainPort for InMemoryInvoiceStore {}

#[async_trait]
impl InvoiceStore for InMemoryInvoiceStore {
    async fn insert(&self, invoice: &Invoice) -> Result<(), PortError> {
        self.check_failure()?;
        let mut invoices = self.invoices.lock().unwrap();
        if invoices.contains_key(&invoice.id) {
            return Err(PortError::conflict(format!(
                "invoice {} already exists",
                invoice.id
            )));
        }
        invoices.insert(invoice.id, invoice.clone());
        Ok(())
    }

    async fn fetch(&self, id: InvoiceId) -> Result<Invoice, PortError> {
        self.check_failure()?;
        self.invoices
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Invoice", id))
    }

    async fn fetch_by_token(&self, token: &PaymentToken) -> Result<Invoice, PortError> {
        self.check_failure()?;
        self.invoices
            .lock()
            .unwrap()
            .values()
            .find(|invoice| &invoice.payment_token == token)
            .cloned()
            .ok_or_else(|| PortError::not_found("Invoice", "by-token"))
    }

    async fn update_derived(&self, invoice: &Invoice) -> Result<(), PortError> {
        self.check_failure()?;
        let mut invoices = self.invoices.lock().unwrap();
        match invoices.get_mut(&invoice.id) {
            Some(stored) => {
                *stored = invoice.clone();
                Ok(())
            }
            None => Err(PortError::not_found("Invoice", invoice.id)),
        }
    }

    async fn list(&self, query: &InvoiceQuery) -> Result<Vec<Invoice>, PortError> {
        self.check_failure()?;
        let invoices = self.invoices.lock().unwrap();
        let mut matches: Vec<Invoice> = invoices
            .values()
            .filter(|invoice| {
                query.status.map_or(true, |s| invoice.status == s)
                    && query
                        .client_email
                        .as_deref()
                        .map_or(true, |e| invoice.client_email == e)
                    && query
                        .session_id
                        .map_or(true, |s| invoice.session_id == Some(s))
            })
            .cloned()
            .collect();

        match query.sort {
            InvoiceSort::IssuedDesc => matches.sort_by(|a, b| b.issued_at.cmp(&a.issued_at)),
            InvoiceSort::IssuedAsc => matches.sort_by(|a, b| a.issued_at.cmp(&b.issued_at)),
            InvoiceSort::DueDateAsc => matches.sort_by(|a, b| a.due_date.cmp(&b.due_date)),
        }

        let offset = query.offset.unwrap_or(0) as usize;
        let matches: Vec<Invoice> = match query.limit {
            Some(limit) => matches.into_iter().skip(offset).take(limit as usize).collect(),
            None => matches.into_iter().skip(offset).collect(),
        };

        Ok(matches)
    }
}

/// In-memory append-only ledger store
#[derive(Default)]
pub struct InMemoryLedgerStore {
    entries: Mutex<Vec<LedgerEntry>>,
    fail_next: AtomicBool,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next store call fail with a connection error
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Returns the number of entries across all invoices
    pub fn entry_count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    fn check_failure(&self) -> Result<(), PortError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(PortError::connection("simulated ledger outage"));
        }
        Ok(())
    }
}

impl DomainPort for InMemoryLedgerStore {}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn append(&self, entry: &LedgerEntry) -> Result<(), PortError> {
        self.check_failure()?;
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn entries_for_invoice(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<Vec<LedgerEntry>, PortError> {
        self.check_failure()?;
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.invoice_id == invoice_id)
            .cloned()
            .collect())
    }
}

/// A recorded outbound email
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Mailer that records every send instead of delivering
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentEmail>>,
    fail: AtomicBool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every send fail until cleared
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    /// Returns the recorded sends
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// Returns how many emails were recorded
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl DomainPort for RecordingMailer {}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), PortError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::unavailable("smtp"));
        }
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        });
        Ok(())
    }
}

/// Programmable payment-gateway stub
#[derive(Default)]
pub struct StubGateway {
    fail: AtomicBool,
    delay: Mutex<Option<Duration>>,
    refunds: Mutex<Vec<(Money, String)>>,
}

impl StubGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every refund fail until cleared
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    /// Delays every refund, for timeout tests
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Returns the refunds the gateway executed
    pub fn refunds(&self) -> Vec<(Money, String)> {
        self.refunds.lock().unwrap().clone()
    }
}

impl DomainPort for StubGateway {}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn refund(&self, amount: Money, reference: &str) -> Result<(), PortError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::unavailable("payment-gateway"));
        }
        self.refunds
            .lock()
            .unwrap()
            .push((amount, reference.to_string()));
        Ok(())
    }
}
