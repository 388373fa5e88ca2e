//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible
//! defaults. Tests specify only the relevant fields and take defaults for
//! everything else.

use chrono::NaiveDate;
use core_kernel::{Money, ServiceId, SessionId};
use domain_invoicing::{Invoice, NewInvoice, PaymentType};

use crate::fixtures::{MoneyFixtures, StringFixtures};

/// Builder for invoice creation input
pub struct NewInvoiceBuilder {
    client_name: String,
    client_email: String,
    title: String,
    notes: Option<String>,
    total_amount: Money,
    payment_type: PaymentType,
    partial_amount: Option<Money>,
    due_date: Option<NaiveDate>,
    session_id: Option<SessionId>,
    service_id: Option<ServiceId>,
}

impl Default for NewInvoiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NewInvoiceBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        Self {
            client_name: StringFixtures::client_name().to_string(),
            client_email: StringFixtures::client_email().to_string(),
            title: StringFixtures::invoice_title().to_string(),
            notes: None,
            total_amount: MoneyFixtures::usd_package(),
            payment_type: PaymentType::Full,
            partial_amount: None,
            due_date: None,
            session_id: None,
            service_id: None,
        }
    }

    /// Sets the client name
    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    /// Sets the client email
    pub fn with_client_email(mut self, email: impl Into<String>) -> Self {
        self.client_email = email.into();
        self
    }

    /// Sets the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the total amount
    pub fn with_total(mut self, total: Money) -> Self {
        self.total_amount = total;
        self
    }

    /// Switches to the partial policy with the given installment
    pub fn with_partial(mut self, partial: Money) -> Self {
        self.payment_type = PaymentType::Partial;
        self.partial_amount = Some(partial);
        self
    }

    /// Sets the due date
    pub fn with_due_date(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }

    /// Attaches a session reference
    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Builds the creation input
    pub fn build(self) -> NewInvoice {
        NewInvoice {
            client_name: self.client_name,
            client_email: self.client_email,
            title: self.title,
            notes: self.notes,
            total_amount: self.total_amount,
            payment_type: self.payment_type,
            partial_amount: self.partial_amount,
            due_date: self.due_date,
            session_id: self.session_id,
            service_id: self.service_id,
        }
    }

    /// Builds a ready invoice, panicking on invalid input (test-only)
    pub fn build_invoice(self) -> Invoice {
        Invoice::new(self.build()).expect("builder produced invalid invoice input")
    }
}
