//! Invoice lifecycle service
//!
//! Orchestrates the money-entry operations: validates inputs against the
//! ledger-derived balance, writes ledger entries, re-runs reconciliation,
//! persists the refreshed invoice, and dispatches notifications.
//!
//! Concurrency model: writers serialize per invoice id behind an in-process
//! lock map, and every validation reads the balance recomputed from the full
//! ledger rather than the cached invoice columns. The cached columns are
//! display state; the ledger is the truth.

use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use core_kernel::{InvoiceId, Money, PaymentToken};

use crate::error::InvoicingError;
use crate::invoice::{Invoice, NewInvoice};
use crate::ledger::{reconcile, LedgerEntry, PaymentMethod, Reconciliation};
use crate::notify::{InvoiceEvent, NotificationDispatcher, NotificationOutcome};
use crate::ports::{InvoiceQuery, InvoiceStore, LedgerStore, Mailer, PaymentGateway};

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Origin of the public site, used for payment links
    pub public_origin: String,
    /// Studio name used in notification emails
    pub studio_name: String,
    /// Upper bound on the gateway call during refunds
    pub gateway_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            public_origin: "http://localhost:8080".to_string(),
            studio_name: "Northlight Studio".to_string(),
            gateway_timeout: Duration::from_secs(10),
        }
    }
}

/// Result of creating an invoice
///
/// The notification outcome is reported separately from the created invoice:
/// a failed email does not undo the creation.
#[derive(Debug)]
pub struct CreateInvoiceOutcome {
    pub invoice: Invoice,
    pub notification: NotificationOutcome,
}

/// Result of recording a payment
#[derive(Debug)]
pub struct RecordPaymentOutcome {
    pub invoice: Invoice,
    pub entry: LedgerEntry,
    pub notification: NotificationOutcome,
}

/// Result of a refund
#[derive(Debug)]
pub struct RefundOutcome {
    pub invoice: Invoice,
    pub entry: LedgerEntry,
}

/// Result of requesting a payment link
#[derive(Debug)]
pub struct PaymentLinkOutcome {
    pub url: String,
    pub amount: Money,
    pub notification: Option<NotificationOutcome>,
}

/// Orchestrates the invoice lifecycle over the persistence, gateway, and
/// mail ports
pub struct InvoicingService {
    invoices: Arc<dyn InvoiceStore>,
    ledger: Arc<dyn LedgerStore>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: NotificationDispatcher,
    gateway_timeout: Duration,
    locks: DashMap<InvoiceId, Arc<Mutex<()>>>,
}

impl InvoicingService {
    /// Creates the service over its ports
    pub fn new(
        invoices: Arc<dyn InvoiceStore>,
        ledger: Arc<dyn LedgerStore>,
        gateway: Arc<dyn PaymentGateway>,
        mailer: Arc<dyn Mailer>,
        config: ServiceConfig,
    ) -> Self {
        let notifier =
            NotificationDispatcher::new(mailer, config.public_origin, config.studio_name);

        Self {
            invoices,
            ledger,
            gateway,
            notifier,
            gateway_timeout: config.gateway_timeout,
            locks: DashMap::new(),
        }
    }

    /// Creates an invoice and sends the "invoice created" email
    ///
    /// # Errors
    ///
    /// Validation or store failures abort with no record created. A
    /// notification failure does not: the outcome reports it alongside the
    /// created invoice.
    pub async fn create_invoice(
        &self,
        input: NewInvoice,
    ) -> Result<CreateInvoiceOutcome, InvoicingError> {
        let invoice = Invoice::new(input)?;
        self.invoices.insert(&invoice).await?;

        tracing::info!(
            invoice = %invoice.invoice_number,
            client = %invoice.client_email,
            total = %invoice.total_amount,
            "invoice created"
        );

        let notification = self
            .notifier
            .dispatch(InvoiceEvent::Created { invoice: &invoice })
            .await;

        Ok(CreateInvoiceOutcome {
            invoice,
            notification,
        })
    }

    /// Records a payment against an invoice
    ///
    /// The amount must lie in `(0, amount_due]` where `amount_due` is
    /// recomputed from the ledger under the invoice's write lock, so
    /// overpayment is impossible even under concurrent attempts.
    ///
    /// # Errors
    ///
    /// Rejected before any ledger write if the amount is out of range or the
    /// invoice is voided. Store failures abort atomically.
    pub async fn record_payment(
        &self,
        invoice_id: InvoiceId,
        amount: Money,
        method: PaymentMethod,
        notes: Option<String>,
    ) -> Result<RecordPaymentOutcome, InvoicingError> {
        let lock = self.lock_for(invoice_id);
        let _guard = lock.lock().await;

        let mut invoice = self.fetch(invoice_id).await?;
        if invoice.is_voided() {
            return Err(InvoicingError::InvoiceVoided(invoice_id));
        }
        self.check_currency(&invoice, amount)?;

        let mut entries = self.ledger.entries_for_invoice(invoice_id).await?;
        let current_due = self.current_due(&invoice, &entries)?;

        if !amount.is_positive() || amount > current_due {
            return Err(InvoicingError::AmountOutOfRange {
                amount,
                amount_due: current_due,
            });
        }

        let mut entry = LedgerEntry::payment(invoice_id, amount, method);
        if let Some(notes) = notes {
            entry = entry.with_notes(notes);
        }
        self.ledger.append(&entry).await?;
        entries.push(entry.clone());

        let reconciliation = reconcile(invoice.total_amount, invoice.status, &entries)?;
        invoice.apply_reconciliation(&reconciliation, Utc::now());
        self.invoices.update_derived(&invoice).await?;

        tracing::info!(
            invoice = %invoice.invoice_number,
            amount = %amount,
            method = %method.as_str(),
            status = %invoice.status,
            "payment recorded"
        );

        let notification = self
            .notifier
            .dispatch(InvoiceEvent::PaymentReceived {
                invoice: &invoice,
                entry: &entry,
            })
            .await;

        Ok(RecordPaymentOutcome {
            invoice,
            entry,
            notification,
        })
    }

    /// Refunds part or all of what has been paid
    ///
    /// The monetary refund is executed by the payment gateway first, under a
    /// timeout; only on gateway success is the negative ledger entry written.
    /// There is no partial-success path: gateway failure or timeout leaves
    /// the ledger untouched.
    ///
    /// # Errors
    ///
    /// Amount-bound violations are rejected before any gateway call;
    /// gateway or store failures abort with no ledger entry.
    pub async fn refund(
        &self,
        invoice_id: InvoiceId,
        amount: Money,
        reason: Option<String>,
    ) -> Result<RefundOutcome, InvoicingError> {
        let lock = self.lock_for(invoice_id);
        let _guard = lock.lock().await;

        let mut invoice = self.fetch(invoice_id).await?;
        if invoice.is_voided() {
            return Err(InvoicingError::InvoiceVoided(invoice_id));
        }
        self.check_currency(&invoice, amount)?;

        let mut entries = self.ledger.entries_for_invoice(invoice_id).await?;
        let current = reconcile(invoice.total_amount, invoice.status, &entries)?;

        if !amount.is_positive() {
            return Err(InvoicingError::validation(
                "refund amount must be greater than zero",
            ));
        }
        if amount > current.amount_paid {
            return Err(InvoicingError::RefundExceedsPayments {
                amount,
                amount_paid: current.amount_paid,
            });
        }

        match tokio::time::timeout(
            self.gateway_timeout,
            self.gateway.refund(amount, &invoice.invoice_number),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(error)) => return Err(InvoicingError::Gateway(error.to_string())),
            Err(_elapsed) => {
                return Err(InvoicingError::Gateway(format!(
                    "refund timed out after {:?}; no ledger entry was written",
                    self.gateway_timeout
                )));
            }
        }

        let entry = LedgerEntry::refund(invoice_id, amount, reason);
        self.ledger.append(&entry).await?;
        entries.push(entry.clone());

        let reconciliation = reconcile(invoice.total_amount, invoice.status, &entries)?;
        invoice.apply_reconciliation(&reconciliation, Utc::now());
        self.invoices.update_derived(&invoice).await?;

        tracing::info!(
            invoice = %invoice.invoice_number,
            amount = %amount,
            status = %invoice.status,
            "refund recorded"
        );

        Ok(RefundOutcome { invoice, entry })
    }

    /// Builds a payment link for the outstanding balance or a custom amount,
    /// optionally emailing it; never mutates the ledger
    ///
    /// # Errors
    ///
    /// Rejected if the invoice has nothing outstanding or a custom amount
    /// falls outside `(0, amount_due]`, the same bound every money-entry
    /// point enforces.
    pub async fn request_payment_link(
        &self,
        invoice_id: InvoiceId,
        amount: Option<Money>,
        send_email: bool,
    ) -> Result<PaymentLinkOutcome, InvoicingError> {
        let invoice = self.fetch(invoice_id).await?;
        if invoice.is_voided() {
            return Err(InvoicingError::InvoiceVoided(invoice_id));
        }

        let entries = self.ledger.entries_for_invoice(invoice_id).await?;
        let current_due = self.current_due(&invoice, &entries)?;

        if !current_due.is_positive() {
            return Err(InvoicingError::validation(
                "invoice has no outstanding balance",
            ));
        }

        let requested = match amount {
            Some(custom) => {
                self.check_currency(&invoice, custom)?;
                if !custom.is_positive() || custom > current_due {
                    return Err(InvoicingError::AmountOutOfRange {
                        amount: custom,
                        amount_due: current_due,
                    });
                }
                custom
            }
            None => current_due,
        };

        let url = self
            .notifier
            .payment_link(&invoice.payment_token, amount.map(|_| requested));

        let notification = if send_email {
            Some(
                self.notifier
                    .dispatch(InvoiceEvent::PaymentRequested {
                        invoice: &invoice,
                        amount: requested,
                    })
                    .await,
            )
        } else {
            None
        };

        Ok(PaymentLinkOutcome {
            url,
            amount: requested,
            notification,
        })
    }

    /// Fetches an invoice with its derived fields recomputed from the ledger
    ///
    /// Reads through this path never trust the cached columns; downstream
    /// gating (gallery access on paid state) must use this, not `list`.
    pub async fn get_invoice(&self, invoice_id: InvoiceId) -> Result<Invoice, InvoicingError> {
        let invoice = self.fetch(invoice_id).await?;
        self.reconciled_view(invoice).await
    }

    /// Fetches an invoice by its public bearer token, reconciled
    pub async fn get_invoice_by_token(
        &self,
        token: &PaymentToken,
    ) -> Result<Invoice, InvoicingError> {
        let invoice = self
            .invoices
            .fetch_by_token(token)
            .await
            .map_err(|error| {
                if error.is_not_found() {
                    // The token is the credential; reveal nothing about why
                    InvoicingError::InvoiceNotFound("unknown payment token".to_string())
                } else {
                    InvoicingError::Store(error)
                }
            })?;
        self.reconciled_view(invoice).await
    }

    /// Lists invoices from the persisted snapshot
    ///
    /// Listing returns the cached columns (best-effort display state); they
    /// converge because writers serialize per invoice.
    pub async fn list_invoices(
        &self,
        query: &InvoiceQuery,
    ) -> Result<Vec<Invoice>, InvoicingError> {
        Ok(self.invoices.list(query).await?)
    }

    /// Administratively voids an invoice; terminal and idempotent
    pub async fn void_invoice(&self, invoice_id: InvoiceId) -> Result<Invoice, InvoicingError> {
        let lock = self.lock_for(invoice_id);
        let _guard = lock.lock().await;

        let mut invoice = self.fetch(invoice_id).await?;
        if invoice.is_voided() {
            return Ok(invoice);
        }

        invoice.void(Utc::now());
        self.invoices.update_derived(&invoice).await?;

        tracing::info!(invoice = %invoice.invoice_number, "invoice voided");
        Ok(invoice)
    }

    /// Returns the invoice with derived fields refreshed from the ledger,
    /// without persisting or touching timestamps
    async fn reconciled_view(&self, mut invoice: Invoice) -> Result<Invoice, InvoicingError> {
        // Voided is administrative state; the ledger does not speak for it
        if invoice.is_voided() {
            return Ok(invoice);
        }

        let entries = self.ledger.entries_for_invoice(invoice.id).await?;
        // An untouched ledger means the stored creation values stand; for a
        // partial invoice amount_due is the first installment, not the total
        if entries.is_empty() {
            return Ok(invoice);
        }

        let Reconciliation {
            status,
            amount_paid,
            amount_due,
            ..
        } = reconcile(invoice.total_amount, invoice.status, &entries)?;

        invoice.status = status;
        invoice.amount_paid = amount_paid;
        invoice.amount_due = amount_due;
        Ok(invoice)
    }

    /// The balance that bounds new payments right now
    ///
    /// With an untouched ledger this is the stored creation value (the first
    /// installment for partial invoices); once any entry exists it is the
    /// reconciled `total_amount - amount_paid`.
    fn current_due(
        &self,
        invoice: &Invoice,
        entries: &[LedgerEntry],
    ) -> Result<Money, InvoicingError> {
        if entries.is_empty() {
            return Ok(invoice.amount_due);
        }
        let current = reconcile(invoice.total_amount, invoice.status, entries)?;
        Ok(current.amount_due)
    }

    async fn fetch(&self, invoice_id: InvoiceId) -> Result<Invoice, InvoicingError> {
        self.invoices.fetch(invoice_id).await.map_err(|error| {
            if error.is_not_found() {
                InvoicingError::InvoiceNotFound(invoice_id.to_string())
            } else {
                InvoicingError::Store(error)
            }
        })
    }

    fn check_currency(&self, invoice: &Invoice, amount: Money) -> Result<(), InvoicingError> {
        if amount.currency() != invoice.total_amount.currency() {
            return Err(InvoicingError::validation(format!(
                "amount currency {} does not match invoice currency {}",
                amount.currency(),
                invoice.total_amount.currency()
            )));
        }
        Ok(())
    }

    fn lock_for(&self, invoice_id: InvoiceId) -> Arc<Mutex<()>> {
        self.locks
            .entry(invoice_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
