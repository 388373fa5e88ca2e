//! API configuration

use serde::Deserialize;
use std::time::Duration;

use domain_invoicing::ServiceConfig;
use infra_mail::MailConfig;

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL
    pub database_url: String,
    /// Origin of the public site, used to build payment links
    pub public_origin: String,
    /// Studio name used in outbound email
    pub studio_name: String,
    /// Gateway call timeout in seconds
    pub gateway_timeout_secs: u64,
    /// Log level
    pub log_level: String,
    /// Outbound mail toggle
    pub smtp_enabled: bool,
    /// SMTP relay host
    pub smtp_host: String,
    /// SMTP port
    pub smtp_port: u16,
    /// SMTP username
    pub smtp_user: String,
    /// SMTP password
    pub smtp_password: String,
    /// Sender display name
    pub smtp_from_name: String,
    /// Sender address
    pub smtp_from_email: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "postgres://localhost/studio".to_string(),
            public_origin: "http://localhost:8080".to_string(),
            studio_name: "Northlight Studio".to_string(),
            gateway_timeout_secs: 10,
            log_level: "info".to_string(),
            smtp_enabled: false,
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_user: String::new(),
            smtp_password: String::new(),
            smtp_from_name: "Northlight Studio".to_string(),
            smtp_from_email: "billing@northlight.example".to_string(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the SMTP adapter configuration
    pub fn mail_config(&self) -> MailConfig {
        MailConfig {
            enabled: self.smtp_enabled,
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            user: self.smtp_user.clone(),
            password: self.smtp_password.clone(),
            from_name: self.smtp_from_name.clone(),
            from_email: self.smtp_from_email.clone(),
        }
    }

    /// Returns the lifecycle-service configuration
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            public_origin: self.public_origin.clone(),
            studio_name: self.studio_name.clone(),
            gateway_timeout: Duration::from_secs(self.gateway_timeout_secs),
        }
    }
}
