//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for common entities across the billing
//! system. These fixtures are designed to be consistent and predictable for
//! unit tests.

use core_kernel::{Currency, InvoiceId, Money, SessionId};
use rust_decimal_macros::dec;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Creates a standard USD amount for testing
    pub fn usd_100() -> Money {
        Money::new(dec!(100.00), Currency::USD)
    }

    /// Typical session deposit
    pub fn usd_deposit() -> Money {
        Money::new(dec!(300.00), Currency::USD)
    }

    /// Typical full package price
    pub fn usd_package() -> Money {
        Money::new(dec!(1000.00), Currency::USD)
    }

    /// Creates a zero amount
    pub fn usd_zero() -> Money {
        Money::zero(Currency::USD)
    }

    /// Creates a EUR amount for currency mismatch tests
    pub fn eur_100() -> Money {
        Money::new(dec!(100.00), Currency::EUR)
    }
}

/// Fixture for string test data
pub struct StringFixtures;

impl StringFixtures {
    /// Standard client name
    pub fn client_name() -> &'static str {
        "Avery Lane"
    }

    /// Standard client email
    pub fn client_email() -> &'static str {
        "avery@example.com"
    }

    /// Standard invoice title
    pub fn invoice_title() -> &'static str {
        "Portrait session"
    }
}

/// Fixture for identifier test data
pub struct IdFixtures;

impl IdFixtures {
    /// Creates a fresh invoice id
    pub fn invoice_id() -> InvoiceId {
        InvoiceId::new_v7()
    }

    /// Creates a fresh session id
    pub fn session_id() -> SessionId {
        SessionId::new_v7()
    }
}
