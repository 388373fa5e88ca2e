//! Payment ledger repository implementation
//!
//! PostgreSQL adapter for the `LedgerStore` port. The ledger table is
//! append-only: this adapter exposes no update or delete path.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use core_kernel::{DomainPort, InvoiceId, LedgerEntryId, Money, PortError};
use domain_invoicing::ports::LedgerStore;
use domain_invoicing::{LedgerEntry, PaymentMethod};

use crate::error::sqlx_to_port;

/// Repository for the append-only payment ledger
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    /// Creates a new repository over the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for LedgerRepository {}

#[async_trait]
impl LedgerStore for LedgerRepository {
    async fn append(&self, entry: &LedgerEntry) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO payment_ledger (id, invoice_id, amount, currency, method, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.invoice_id.as_uuid())
        .bind(entry.amount.amount())
        .bind(entry.amount.currency().code())
        .bind(entry.method.as_str())
        .bind(&entry.notes)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(sqlx_to_port)?;

        Ok(())
    }

    async fn entries_for_invoice(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<Vec<LedgerEntry>, PortError> {
        let rows = sqlx::query_as::<_, LedgerRow>(
            r#"
            SELECT id, invoice_id, amount, currency, method, notes, created_at
            FROM payment_ledger
            WHERE invoice_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(invoice_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(sqlx_to_port)?;

        rows.into_iter().map(LedgerRow::into_domain).collect()
    }
}

/// Database row for a ledger entry
#[derive(Debug, Clone, sqlx::FromRow)]
struct LedgerRow {
    id: Uuid,
    invoice_id: Uuid,
    amount: Decimal,
    currency: String,
    method: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl LedgerRow {
    fn into_domain(self) -> Result<LedgerEntry, PortError> {
        let currency: core_kernel::Currency = self
            .currency
            .parse()
            .map_err(|e: core_kernel::MoneyError| PortError::internal(e.to_string()))?;
        // PaymentMethod parsing is infallible; unknown tags become Other
        let method: PaymentMethod = self.method.parse().unwrap_or(PaymentMethod::Other);

        Ok(LedgerEntry {
            id: LedgerEntryId::from_uuid(self.id),
            invoice_id: InvoiceId::from_uuid(self.invoice_id),
            amount: Money::new(self.amount, currency),
            method,
            notes: self.notes,
            created_at: self.created_at,
        })
    }
}
