//! Core Kernel - Foundational types and utilities for the studio billing system
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Strongly-typed identifiers and bearer tokens
//! - Ports-and-adapters error infrastructure

pub mod error;
pub mod identifiers;
pub mod money;
pub mod ports;
pub mod token;

pub use error::CoreError;
pub use identifiers::{InvoiceId, LedgerEntryId, ServiceId, SessionId};
pub use money::{Currency, Money, MoneyError};
pub use ports::{DomainPort, PortError};
pub use token::PaymentToken;
