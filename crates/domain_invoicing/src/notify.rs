//! Client notifications
//!
//! Every lifecycle email goes through a single dispatch point so the
//! fail-open policy lives in one place: a notification failure is logged and
//! reported as a soft outcome, and never bubbles up as an error from the
//! operation that triggered it. Ledger writes are fail-closed; emails are
//! fail-open.

use serde::Serialize;
use std::sync::Arc;

use core_kernel::{Money, PaymentToken};

use crate::invoice::{Invoice, InvoiceStatus};
use crate::ledger::LedgerEntry;
use crate::ports::Mailer;

/// Lifecycle events that trigger a client email
#[derive(Debug)]
pub enum InvoiceEvent<'a> {
    /// A new invoice was issued
    Created { invoice: &'a Invoice },
    /// A payment landed on the ledger
    PaymentReceived {
        invoice: &'a Invoice,
        entry: &'a LedgerEntry,
    },
    /// A payment was requested without any state change
    PaymentRequested { invoice: &'a Invoice, amount: Money },
}

/// Result of a notification attempt
///
/// Failures are soft: the triggering operation has already succeeded and the
/// caller is told both facts distinctly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum NotificationOutcome {
    Sent,
    Failed { reason: String },
}

impl NotificationOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, NotificationOutcome::Sent)
    }
}

/// Formats and sends the lifecycle emails
pub struct NotificationDispatcher {
    mailer: Arc<dyn Mailer>,
    public_origin: String,
    studio_name: String,
}

impl NotificationDispatcher {
    /// Creates a dispatcher
    ///
    /// # Arguments
    ///
    /// * `mailer` - outbound email port
    /// * `public_origin` - origin of the public site, used to build payment links
    /// * `studio_name` - sender name used in subjects and bodies
    pub fn new(
        mailer: Arc<dyn Mailer>,
        public_origin: impl Into<String>,
        studio_name: impl Into<String>,
    ) -> Self {
        Self {
            mailer,
            public_origin: public_origin.into().trim_end_matches('/').to_string(),
            studio_name: studio_name.into(),
        }
    }

    /// Builds the public payment link for a token
    ///
    /// The token is percent-encoded into the path; a custom amount is carried
    /// as a query parameter.
    pub fn payment_link(&self, token: &PaymentToken, amount: Option<Money>) -> String {
        let mut url = format!(
            "{}/pay/{}",
            self.public_origin,
            urlencoding::encode(token.expose())
        );
        if let Some(amount) = amount {
            url.push_str(&format!("?amount={}", amount.amount()));
        }
        url
    }

    /// Renders and sends the email for an event
    ///
    /// Never returns an error: delivery failures are logged at `warn` and
    /// reported as [`NotificationOutcome::Failed`] so callers can surface the
    /// soft warning alongside their primary result.
    pub async fn dispatch(&self, event: InvoiceEvent<'_>) -> NotificationOutcome {
        let (to, subject, html) = self.render(&event);

        match self.mailer.send(&to, &subject, &html).await {
            Ok(()) => {
                tracing::info!(to = %to, subject = %subject, "notification sent");
                NotificationOutcome::Sent
            }
            Err(error) => {
                tracing::warn!(
                    to = %to,
                    subject = %subject,
                    %error,
                    "notification failed; the triggering operation is unaffected"
                );
                NotificationOutcome::Failed {
                    reason: error.to_string(),
                }
            }
        }
    }

    fn render(&self, event: &InvoiceEvent<'_>) -> (String, String, String) {
        match event {
            InvoiceEvent::Created { invoice } => self.render_created(invoice),
            InvoiceEvent::PaymentReceived { invoice, entry } => {
                self.render_payment_received(invoice, entry)
            }
            InvoiceEvent::PaymentRequested { invoice, amount } => {
                self.render_payment_requested(invoice, *amount)
            }
        }
    }

    fn render_created(&self, invoice: &Invoice) -> (String, String, String) {
        let link = self.payment_link(&invoice.payment_token, None);
        let subject = format!(
            "Invoice {} from {}",
            invoice.invoice_number, self.studio_name
        );

        let due_line = match invoice.due_date {
            Some(due) => format!("<p>Payment is due by <strong>{}</strong>.</p>", due),
            None => String::new(),
        };

        let html = format!(
            "<div style=\"font-family:Georgia,serif;max-width:560px;margin:0 auto\">\
             <h2>{studio}</h2>\
             <p>Hi {name},</p>\
             <p>Your invoice <strong>{number}</strong> for <em>{title}</em> is ready.</p>\
             <p>Amount due: <strong>{due}</strong></p>\
             {due_line}\
             <p><a href=\"{link}\">View and pay your invoice</a></p>\
             <p>Thank you!<br/>{studio}</p>\
             </div>",
            studio = self.studio_name,
            name = invoice.client_name,
            number = invoice.invoice_number,
            title = invoice.title,
            due = invoice.amount_due,
            due_line = due_line,
            link = link,
        );

        (invoice.client_email.clone(), subject, html)
    }

    fn render_payment_received(
        &self,
        invoice: &Invoice,
        entry: &LedgerEntry,
    ) -> (String, String, String) {
        if invoice.status == InvoiceStatus::FullyPaid {
            let subject = format!("Invoice {} is paid in full", invoice.invoice_number);
            let html = format!(
                "<div style=\"font-family:Georgia,serif;max-width:560px;margin:0 auto\">\
                 <h2>{studio}</h2>\
                 <p>Hi {name},</p>\
                 <p>We received your payment of <strong>{amount}</strong> for invoice \
                 <strong>{number}</strong>. You're all set, nothing further is due.</p>\
                 <p>We can't wait to share the results with you.</p>\
                 <p>With gratitude,<br/>{studio}</p>\
                 </div>",
                studio = self.studio_name,
                name = invoice.client_name,
                amount = entry.amount,
                number = invoice.invoice_number,
            );
            (invoice.client_email.clone(), subject, html)
        } else {
            let link = self.payment_link(&invoice.payment_token, None);
            let subject = format!("Payment received for invoice {}", invoice.invoice_number);
            let html = format!(
                "<div style=\"font-family:Georgia,serif;max-width:560px;margin:0 auto\">\
                 <h2>{studio}</h2>\
                 <p>Hi {name},</p>\
                 <p>We received your payment of <strong>{amount}</strong> for invoice \
                 <strong>{number}</strong>.</p>\
                 <p>Remaining balance: <strong>{remaining}</strong></p>\
                 <p>You can settle the rest whenever you're ready: \
                 <a href=\"{link}\">pay the remaining balance</a>.</p>\
                 <p>Thank you!<br/>{studio}</p>\
                 </div>",
                studio = self.studio_name,
                name = invoice.client_name,
                amount = entry.amount,
                number = invoice.invoice_number,
                remaining = invoice.amount_due,
                link = link,
            );
            (invoice.client_email.clone(), subject, html)
        }
    }

    fn render_payment_requested(&self, invoice: &Invoice, amount: Money) -> (String, String, String) {
        let link = self.payment_link(&invoice.payment_token, Some(amount));
        let subject = format!("Payment request for invoice {}", invoice.invoice_number);
        let html = format!(
            "<div style=\"font-family:Georgia,serif;max-width:560px;margin:0 auto\">\
             <h2>{studio}</h2>\
             <p>Hi {name},</p>\
             <p>This is a friendly reminder about invoice <strong>{number}</strong> \
             for <em>{title}</em>.</p>\
             <p>Requested amount: <strong>{amount}</strong></p>\
             <p><a href=\"{link}\">Pay securely online</a></p>\
             <p>Thank you!<br/>{studio}</p>\
             </div>",
            studio = self.studio_name,
            name = invoice.client_name,
            number = invoice.invoice_number,
            title = invoice.title,
            amount = amount,
            link = link,
        );
        (invoice.client_email.clone(), subject, html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    use crate::invoice::{Invoice, NewInvoice, PaymentType};
    use crate::ledger::PaymentMethod;

    fn test_invoice() -> Invoice {
        Invoice::new(NewInvoice {
            client_name: "Avery Lane".to_string(),
            client_email: "avery@example.com".to_string(),
            title: "Wedding package".to_string(),
            notes: None,
            total_amount: Money::new(dec!(2500), Currency::USD),
            payment_type: PaymentType::Full,
            partial_amount: None,
            due_date: None,
            session_id: None,
            service_id: None,
        })
        .unwrap()
    }

    struct NullMailer;

    #[async_trait::async_trait]
    impl Mailer for NullMailer {
        async fn send(
            &self,
            _to: &str,
            _subject: &str,
            _html: &str,
        ) -> Result<(), core_kernel::PortError> {
            Ok(())
        }
    }

    impl core_kernel::DomainPort for NullMailer {}

    fn dispatcher() -> NotificationDispatcher {
        NotificationDispatcher::new(
            Arc::new(NullMailer),
            "https://studio.example.com/",
            "Northlight Studio",
        )
    }

    #[test]
    fn test_payment_link_encodes_token() {
        let d = dispatcher();
        let token = PaymentToken::from_string("abc123");

        assert_eq!(
            d.payment_link(&token, None),
            "https://studio.example.com/pay/abc123"
        );
    }

    #[test]
    fn test_payment_link_with_custom_amount() {
        let d = dispatcher();
        let token = PaymentToken::from_string("abc123");
        let amount = Money::new(dec!(150.50), Currency::USD);

        assert_eq!(
            d.payment_link(&token, Some(amount)),
            "https://studio.example.com/pay/abc123?amount=150.50"
        );
    }

    #[test]
    fn test_created_email_carries_payment_link() {
        let d = dispatcher();
        let invoice = test_invoice();

        let (to, subject, html) = d.render(&InvoiceEvent::Created { invoice: &invoice });

        assert_eq!(to, invoice.client_email);
        assert!(subject.contains(&invoice.invoice_number));
        assert!(html.contains(&format!("/pay/{}", invoice.payment_token.expose())));
    }

    #[test]
    fn test_partial_payment_email_shows_remaining_balance() {
        let d = dispatcher();
        let mut invoice = test_invoice();
        invoice.status = InvoiceStatus::PartialPaid;
        invoice.amount_due = Money::new(dec!(1500), Currency::USD);

        let entry = crate::ledger::LedgerEntry::payment(
            invoice.id,
            Money::new(dec!(1000), Currency::USD),
            PaymentMethod::Card,
        );

        let (_, subject, html) = d.render(&InvoiceEvent::PaymentReceived {
            invoice: &invoice,
            entry: &entry,
        });

        assert!(subject.contains("Payment received"));
        assert!(html.contains("Remaining balance"));
        assert!(html.contains("1500"));
    }

    #[test]
    fn test_full_payment_email_has_no_balance_reminder() {
        let d = dispatcher();
        let mut invoice = test_invoice();
        invoice.status = InvoiceStatus::FullyPaid;
        invoice.amount_due = Money::zero(Currency::USD);

        let entry = crate::ledger::LedgerEntry::payment(
            invoice.id,
            Money::new(dec!(2500), Currency::USD),
            PaymentMethod::Card,
        );

        let (_, subject, html) = d.render(&InvoiceEvent::PaymentReceived {
            invoice: &invoice,
            entry: &entry,
        });

        assert!(subject.contains("paid in full"));
        assert!(!html.contains("Remaining balance"));
    }

    #[test]
    fn test_payment_request_email_links_custom_amount() {
        let d = dispatcher();
        let invoice = test_invoice();
        let amount = Money::new(dec!(500), Currency::USD);

        let (_, subject, html) = d.render(&InvoiceEvent::PaymentRequested {
            invoice: &invoice,
            amount,
        });

        assert!(subject.contains("Payment request"));
        assert!(html.contains("?amount=500"));
    }
}
