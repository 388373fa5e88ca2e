//! Mail Infrastructure Layer
//!
//! SMTP adapter for the domain's outbound mail port.

pub mod smtp;

pub use smtp::{MailConfig, SmtpMailer};
