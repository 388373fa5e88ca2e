//! Invoice request/response DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{Currency, Money, ServiceId, SessionId};
use domain_invoicing::{
    Invoice, InvoiceStatus, LedgerEntry, NewInvoice, NotificationOutcome, PaymentMethod,
    PaymentType,
};

/// Request to create an invoice
#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    #[validate(length(min = 1, message = "client_name is required"))]
    pub client_name: String,
    #[validate(email(message = "client_email must be a valid email address"))]
    pub client_email: String,
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub notes: Option<String>,
    pub currency: Currency,
    pub total_amount: Decimal,
    pub payment_type: PaymentType,
    pub partial_amount: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub session_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
}

impl CreateInvoiceRequest {
    /// Converts the request into the domain creation input
    pub fn into_domain(self) -> NewInvoice {
        NewInvoice {
            client_name: self.client_name,
            client_email: self.client_email,
            title: self.title,
            notes: self.notes,
            total_amount: Money::new(self.total_amount, self.currency),
            payment_type: self.payment_type,
            partial_amount: self.partial_amount.map(|a| Money::new(a, self.currency)),
            due_date: self.due_date,
            session_id: self.session_id.map(SessionId::from_uuid),
            service_id: self.service_id.map(ServiceId::from_uuid),
        }
    }
}

/// Request to record a payment
#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub notes: Option<String>,
}

/// Request to refund
#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    pub amount: Decimal,
    pub reason: Option<String>,
}

/// Request for a payment link
#[derive(Debug, Deserialize)]
pub struct PaymentLinkRequest {
    /// Custom amount; omitted means the full outstanding balance
    pub amount: Option<Decimal>,
    /// Whether to email the link to the client
    #[serde(default)]
    pub send_email: bool,
}

/// Query parameters for listing invoices
#[derive(Debug, Default, Deserialize)]
pub struct ListInvoicesParams {
    pub status: Option<String>,
    pub client_email: Option<String>,
    pub session_id: Option<Uuid>,
    pub sort: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Notification result reported alongside the primary outcome
///
/// A failed email never fails the operation; both facts travel separately.
#[derive(Debug, Serialize)]
pub struct NotificationStatus {
    pub sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl From<NotificationOutcome> for NotificationStatus {
    fn from(outcome: NotificationOutcome) -> Self {
        match outcome {
            NotificationOutcome::Sent => Self {
                sent: true,
                warning: None,
            },
            NotificationOutcome::Failed { reason } => Self {
                sent: false,
                warning: Some(format!("notification email failed: {}", reason)),
            },
        }
    }
}

/// Admin-facing invoice representation
#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub id: Uuid,
    pub invoice_number: String,
    pub client_name: String,
    pub client_email: String,
    pub title: String,
    pub notes: Option<String>,
    pub currency: Currency,
    pub total_amount: Decimal,
    pub payment_type: PaymentType,
    pub partial_amount: Option<Decimal>,
    pub amount_paid: Decimal,
    pub amount_due: Decimal,
    pub status: InvoiceStatus,
    /// Status with the time-based overdue label applied
    pub display_status: InvoiceStatus,
    /// Shareable payment link for this invoice
    pub payment_url: String,
    pub due_date: Option<NaiveDate>,
    pub issued_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub session_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
}

impl InvoiceResponse {
    /// Builds the response from a domain invoice
    pub fn from_domain(invoice: Invoice, public_origin: &str) -> Self {
        let today = Utc::now().date_naive();
        let payment_url = format!(
            "{}/pay/{}",
            public_origin.trim_end_matches('/'),
            urlencoding_encode(invoice.payment_token.expose())
        );

        Self {
            id: *invoice.id.as_uuid(),
            display_status: invoice.display_status(today),
            payment_url,
            invoice_number: invoice.invoice_number,
            client_name: invoice.client_name,
            client_email: invoice.client_email,
            title: invoice.title,
            notes: invoice.notes,
            currency: invoice.total_amount.currency(),
            total_amount: invoice.total_amount.amount(),
            payment_type: invoice.payment_type,
            partial_amount: invoice.partial_amount.map(|m| m.amount()),
            amount_paid: invoice.amount_paid.amount(),
            amount_due: invoice.amount_due.amount(),
            status: invoice.status,
            due_date: invoice.due_date,
            issued_at: invoice.issued_at,
            paid_at: invoice.paid_at,
            session_id: invoice.session_id.map(|s| *s.as_uuid()),
            service_id: invoice.service_id.map(|s| *s.as_uuid()),
        }
    }
}

// Tokens are hex, but the link format promises percent-encoding for any
// stored token value
fn urlencoding_encode(token: &str) -> String {
    urlencoding::encode(token).into_owned()
}

/// Ledger entry representation
#[derive(Debug, Serialize)]
pub struct LedgerEntryResponse {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub amount: Decimal,
    pub currency: Currency,
    pub method: PaymentMethod,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<LedgerEntry> for LedgerEntryResponse {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            id: *entry.id.as_uuid(),
            invoice_id: *entry.invoice_id.as_uuid(),
            amount: entry.amount.amount(),
            currency: entry.amount.currency(),
            method: entry.method,
            notes: entry.notes,
            created_at: entry.created_at,
        }
    }
}

/// Response to invoice creation
#[derive(Debug, Serialize)]
pub struct CreateInvoiceResponse {
    pub invoice: InvoiceResponse,
    pub notification: NotificationStatus,
}

/// Response to recording a payment
#[derive(Debug, Serialize)]
pub struct RecordPaymentResponse {
    pub invoice: InvoiceResponse,
    pub entry: LedgerEntryResponse,
    pub notification: NotificationStatus,
}

/// Response to a refund
#[derive(Debug, Serialize)]
pub struct RefundResponse {
    pub invoice: InvoiceResponse,
    pub entry: LedgerEntryResponse,
}

/// Response to a payment-link request
#[derive(Debug, Serialize)]
pub struct PaymentLinkResponse {
    pub url: String,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationStatus>,
}

/// Public payment-page representation; exposes no admin detail
#[derive(Debug, Serialize)]
pub struct PublicInvoiceResponse {
    pub invoice_number: String,
    pub client_name: String,
    pub title: String,
    pub currency: Currency,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    pub amount_due: Decimal,
    pub status: InvoiceStatus,
    pub due_date: Option<NaiveDate>,
}

impl From<Invoice> for PublicInvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        let today = Utc::now().date_naive();
        Self {
            status: invoice.display_status(today),
            invoice_number: invoice.invoice_number,
            client_name: invoice.client_name,
            title: invoice.title,
            currency: invoice.total_amount.currency(),
            total_amount: invoice.total_amount.amount(),
            amount_paid: invoice.amount_paid.amount(),
            amount_due: invoice.amount_due.amount(),
            due_date: invoice.due_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use validator::Validate;

    fn create_request() -> CreateInvoiceRequest {
        CreateInvoiceRequest {
            client_name: "Avery Lane".to_string(),
            client_email: "avery@example.com".to_string(),
            title: "Portrait session".to_string(),
            notes: None,
            currency: Currency::USD,
            total_amount: dec!(1000),
            payment_type: PaymentType::Partial,
            partial_amount: Some(dec!(300)),
            due_date: None,
            session_id: None,
            service_id: None,
        }
    }

    #[test]
    fn test_create_request_validates_email() {
        let mut request = create_request();
        assert!(request.validate().is_ok());

        request.client_email = "nope".to_string();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_request_into_domain() {
        let new_invoice = create_request().into_domain();

        assert_eq!(new_invoice.total_amount.amount(), dec!(1000));
        assert_eq!(new_invoice.total_amount.currency(), Currency::USD);
        assert_eq!(
            new_invoice.partial_amount.unwrap().currency(),
            Currency::USD
        );
    }

    #[test]
    fn test_invoice_response_carries_payment_url() {
        let invoice = Invoice::new(create_request().into_domain()).unwrap();
        let token = invoice.payment_token.expose().to_string();

        let response = InvoiceResponse::from_domain(invoice, "https://studio.example.com/");

        assert_eq!(
            response.payment_url,
            format!("https://studio.example.com/pay/{}", token)
        );
        assert_eq!(response.amount_due, dec!(300));
    }

    #[test]
    fn test_public_response_hides_token_and_notes() {
        let invoice = Invoice::new(create_request().into_domain()).unwrap();
        let public = PublicInvoiceResponse::from(invoice);

        let json = serde_json::to_value(&public).unwrap();
        assert!(json.get("payment_url").is_none());
        assert!(json.get("notes").is_none());
        assert!(!json["invoice_number"].as_str().unwrap().is_empty());
    }
}
