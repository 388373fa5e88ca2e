//! Invoice repository implementation
//!
//! PostgreSQL adapter for the `InvoiceStore` port. Runtime-checked queries
//! are used throughout so the crate builds without a live database.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use core_kernel::{DomainPort, InvoiceId, Money, PaymentToken, PortError};
use domain_invoicing::ports::{InvoiceQuery, InvoiceSort, InvoiceStore};
use domain_invoicing::Invoice;

use crate::error::sqlx_to_port;

const SELECT_COLUMNS: &str = "id, invoice_number, client_name, client_email, title, notes, \
     currency, total_amount, payment_type, partial_amount, amount_paid, amount_due, status, \
     payment_token, due_date, issued_at, paid_at, session_id, service_id, created_at, updated_at";

/// Repository for invoice records
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    /// Creates a new repository over the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for InvoiceRepository {}

#[async_trait]
impl InvoiceStore for InvoiceRepository {
    async fn insert(&self, invoice: &Invoice) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, invoice_number, client_name, client_email, title, notes,
                currency, total_amount, payment_type, partial_amount,
                amount_paid, amount_due, status, payment_token, due_date,
                issued_at, paid_at, session_id, service_id, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21
            )
            "#,
        )
        .bind(invoice.id.as_uuid())
        .bind(&invoice.invoice_number)
        .bind(&invoice.client_name)
        .bind(&invoice.client_email)
        .bind(&invoice.title)
        .bind(&invoice.notes)
        .bind(invoice.total_amount.currency().code())
        .bind(invoice.total_amount.amount())
        .bind(invoice.payment_type.as_str())
        .bind(invoice.partial_amount.map(|m| m.amount()))
        .bind(invoice.amount_paid.amount())
        .bind(invoice.amount_due.amount())
        .bind(invoice.status.as_str())
        .bind(invoice.payment_token.expose())
        .bind(invoice.due_date)
        .bind(invoice.issued_at)
        .bind(invoice.paid_at)
        .bind(invoice.session_id.map(|s| *s.as_uuid()))
        .bind(invoice.service_id.map(|s| *s.as_uuid()))
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&self.pool)
        .await
        .map_err(sqlx_to_port)?;

        Ok(())
    }

    async fn fetch(&self, id: InvoiceId) -> Result<Invoice, PortError> {
        let sql = format!("SELECT {} FROM invoices WHERE id = $1", SELECT_COLUMNS);

        let row = sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(sqlx_to_port)?
            .ok_or_else(|| PortError::not_found("Invoice", id))?;

        row.into_domain()
    }

    async fn fetch_by_token(&self, token: &PaymentToken) -> Result<Invoice, PortError> {
        let sql = format!(
            "SELECT {} FROM invoices WHERE payment_token = $1",
            SELECT_COLUMNS
        );

        let row = sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(token.expose())
            .fetch_optional(&self.pool)
            .await
            .map_err(sqlx_to_port)?
            // The token itself stays out of the error message
            .ok_or_else(|| PortError::not_found("Invoice", "by-token"))?;

        row.into_domain()
    }

    async fn update_derived(&self, invoice: &Invoice) -> Result<(), PortError> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET amount_paid = $2, amount_due = $3, status = $4,
                paid_at = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(invoice.id.as_uuid())
        .bind(invoice.amount_paid.amount())
        .bind(invoice.amount_due.amount())
        .bind(invoice.status.as_str())
        .bind(invoice.paid_at)
        .bind(invoice.updated_at)
        .execute(&self.pool)
        .await
        .map_err(sqlx_to_port)?;

        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Invoice", invoice.id));
        }
        Ok(())
    }

    async fn list(&self, query: &InvoiceQuery) -> Result<Vec<Invoice>, PortError> {
        let order = match query.sort {
            InvoiceSort::IssuedDesc => "issued_at DESC",
            InvoiceSort::IssuedAsc => "issued_at ASC",
            InvoiceSort::DueDateAsc => "due_date ASC NULLS LAST",
        };

        let sql = format!(
            r#"
            SELECT {}
            FROM invoices
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR client_email = $2)
              AND ($3::uuid IS NULL OR session_id = $3)
            ORDER BY {}
            LIMIT $4 OFFSET $5
            "#,
            SELECT_COLUMNS, order
        );

        let rows = sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(query.status.map(|s| s.as_str()))
            .bind(query.client_email.as_deref())
            .bind(query.session_id.map(|s| *s.as_uuid()))
            .bind(query.limit.map(i64::from))
            .bind(i64::from(query.offset.unwrap_or(0)))
            .fetch_all(&self.pool)
            .await
            .map_err(sqlx_to_port)?;

        rows.into_iter().map(InvoiceRow::into_domain).collect()
    }
}

/// Database row for an invoice
#[derive(Debug, Clone, sqlx::FromRow)]
struct InvoiceRow {
    id: Uuid,
    invoice_number: String,
    client_name: String,
    client_email: String,
    title: String,
    notes: Option<String>,
    currency: String,
    total_amount: Decimal,
    payment_type: String,
    partial_amount: Option<Decimal>,
    amount_paid: Decimal,
    amount_due: Decimal,
    status: String,
    payment_token: String,
    due_date: Option<NaiveDate>,
    issued_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
    session_id: Option<Uuid>,
    service_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InvoiceRow {
    fn into_domain(self) -> Result<Invoice, PortError> {
        let currency: core_kernel::Currency = self
            .currency
            .parse()
            .map_err(|e: core_kernel::MoneyError| PortError::internal(e.to_string()))?;
        let status = self
            .status
            .parse()
            .map_err(|e: domain_invoicing::invoice::ParseFieldError| {
                PortError::internal(e.to_string())
            })?;
        let payment_type = self
            .payment_type
            .parse()
            .map_err(|e: domain_invoicing::invoice::ParseFieldError| {
                PortError::internal(e.to_string())
            })?;

        Ok(Invoice {
            id: InvoiceId::from_uuid(self.id),
            invoice_number: self.invoice_number,
            client_name: self.client_name,
            client_email: self.client_email,
            title: self.title,
            notes: self.notes,
            total_amount: Money::new(self.total_amount, currency),
            payment_type,
            partial_amount: self.partial_amount.map(|a| Money::new(a, currency)),
            amount_paid: Money::new(self.amount_paid, currency),
            amount_due: Money::new(self.amount_due, currency),
            status,
            payment_token: PaymentToken::from_string(self.payment_token),
            due_date: self.due_date,
            issued_at: self.issued_at,
            paid_at: self.paid_at,
            session_id: self.session_id.map(core_kernel::SessionId::from_uuid),
            service_id: self.service_id.map(core_kernel::ServiceId::from_uuid),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
