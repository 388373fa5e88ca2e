//! SMTP mailer adapter
//!
//! Implements the domain's `Mailer` port over lettre's async SMTP transport.
//! When SMTP is disabled (local development without credentials), sends fail
//! with a service-unavailable port error; the domain's dispatcher treats that
//! as a soft outcome, so disabled mail never blocks billing operations.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::Deserialize;

use core_kernel::{DomainPort, PortError};
use domain_invoicing::ports::Mailer;

/// SMTP configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Whether outbound mail is enabled
    pub enabled: bool,
    /// SMTP relay host
    pub host: String,
    /// SMTP port
    pub port: u16,
    /// SMTP username
    pub user: String,
    /// SMTP password
    pub password: String,
    /// Sender display name
    pub from_name: String,
    /// Sender address
    pub from_email: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "localhost".to_string(),
            port: 587,
            user: String::new(),
            password: String::new(),
            from_name: "Northlight Studio".to_string(),
            from_email: "billing@northlight.example".to_string(),
        }
    }
}

/// Mailer adapter backed by an async SMTP transport
pub struct SmtpMailer {
    config: MailConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpMailer {
    /// Creates the mailer; builds the transport only when mail is enabled
    ///
    /// # Errors
    ///
    /// Returns `PortError::Internal` if the relay configuration is invalid.
    pub fn new(config: MailConfig) -> Result<Self, PortError> {
        if !config.enabled {
            return Ok(Self {
                config,
                transport: None,
            });
        }

        let creds = Credentials::new(config.user.clone(), config.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| PortError::internal(format!("Failed to create SMTP relay: {}", e)))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            config,
            transport: Some(transport),
        })
    }

    fn from_mailbox(&self) -> Result<Mailbox, PortError> {
        format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| PortError::internal(format!("Invalid from address: {}", e)))
    }
}

impl DomainPort for SmtpMailer {}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), PortError> {
        let transport = match &self.transport {
            Some(transport) => transport,
            None => return Err(PortError::unavailable("smtp (outbound mail disabled)")),
        };

        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| PortError::validation_field(format!("Invalid recipient: {}", e), "to"))?;

        let message = Message::builder()
            .from(self.from_mailbox()?)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| PortError::internal(format!("Failed to build message: {}", e)))?;

        transport.send(message).await.map_err(|e| {
            PortError::Connection {
                message: format!("Failed to send email: {}", e),
                source: Some(Box::new(e)),
            }
        })?;

        tracing::info!(to = %to, subject = %subject, "email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_config_builds_without_transport() {
        let mailer = SmtpMailer::new(MailConfig::default()).unwrap();
        assert!(mailer.transport.is_none());
    }

    #[tokio::test]
    async fn test_disabled_mailer_reports_unavailable() {
        let mailer = SmtpMailer::new(MailConfig::default()).unwrap();

        let result = mailer
            .send("client@example.com", "Test", "<p>hello</p>")
            .await;

        match result {
            Err(error) => assert!(error.is_transient()),
            Ok(()) => panic!("disabled mailer must not report success"),
        }
    }
}
