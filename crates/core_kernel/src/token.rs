//! Bearer tokens for public payment-page access
//!
//! A payment token is an unguessable secret: anyone holding it can view and
//! pay the invoice it belongs to. Tokens are generated once at invoice
//! creation and never rotated. Display and Debug output is redacted so the
//! secret cannot leak through logs; the only way to read the full value is
//! an explicit call to [`PaymentToken::expose`].

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of random bytes backing a token (hex-encoded to 64 characters)
const TOKEN_BYTES: usize = 32;

/// An unguessable bearer secret granting access to an invoice's payment page
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentToken(String);

impl PaymentToken {
    /// Generates a fresh random token
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Wraps a token value loaded from storage
    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the full secret value
    ///
    /// Only use this where the token is deliberately disclosed: building the
    /// payment link for a notification email, or persisting the invoice.
    pub fn expose(&self) -> &str {
        &self.0
    }

    fn redacted(&self) -> String {
        let visible = self.0.chars().take(4).collect::<String>();
        format!("{}…", visible)
    }
}

impl fmt::Display for PaymentToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.redacted())
    }
}

impl fmt::Debug for PaymentToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PaymentToken({})", self.redacted())
    }
}
