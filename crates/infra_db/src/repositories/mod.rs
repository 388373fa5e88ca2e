//! Repository implementations for the domain ports

pub mod invoices;
pub mod ledger;

pub use invoices::InvoiceRepository;
pub use ledger::LedgerRepository;
