//! Database Infrastructure Layer
//!
//! PostgreSQL adapters for the invoicing domain ports, built on SQLx:
//!
//! - [`InvoiceRepository`]: invoice records with atomic derived-field updates
//! - [`LedgerRepository`]: the append-only payment ledger
//! - Pool configuration and embedded migrations

pub mod error;
pub mod pool;
pub mod repositories;

pub use error::DatabaseError;
pub use pool::{create_pool, create_pool_from_url, run_migrations, DatabaseConfig, DatabasePool};
pub use repositories::{InvoiceRepository, LedgerRepository};
