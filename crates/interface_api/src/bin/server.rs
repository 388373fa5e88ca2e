//! Studio Billing Core - API Server Binary
//!
//! This binary starts the HTTP API server for the studio billing core.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin studio-api
//!
//! # Run with environment variables
//! API_HOST=0.0.0.0 API_PORT=8080 DATABASE_URL=postgres://... cargo run --bin studio-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_DATABASE_URL` / `DATABASE_URL` - PostgreSQL connection string
//! * `API_PUBLIC_ORIGIN` - Origin used in client-facing payment links
//! * `API_STUDIO_NAME` - Sender name in outbound email
//! * `API_SMTP_*` - SMTP relay settings (`ENABLED`, `HOST`, `PORT`, `USER`,
//!   `PASSWORD`, `FROM_NAME`, `FROM_EMAIL`)
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use core_kernel::{DomainPort, Money, PortError};
use domain_invoicing::{ports::PaymentGateway, InvoicingService};
use infra_db::{create_pool, run_migrations, DatabaseConfig, InvoiceRepository, LedgerRepository};
use infra_mail::SmtpMailer;
use interface_api::{config::ApiConfig, create_router, AppState};

/// Main entry point for the API server.
///
/// Initializes logging, loads configuration, establishes the database
/// connection, wires the domain service over its adapters, and starts the
/// HTTP server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    // Load configuration from environment
    let config = load_config();

    // Initialize tracing/logging
    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting Studio Billing Core API Server"
    );

    // Create database connection pool and apply migrations
    let pool = create_pool(DatabaseConfig::new(&config.database_url)).await?;
    run_migrations(&pool).await?;

    // Wire the domain service over its adapters
    let invoices = Arc::new(InvoiceRepository::new(pool.clone()));
    let ledger = Arc::new(LedgerRepository::new(pool.clone()));
    let mailer = Arc::new(SmtpMailer::new(config.mail_config())?);
    let gateway = Arc::new(UnconfiguredGateway);

    let service = Arc::new(InvoicingService::new(
        invoices,
        ledger,
        gateway,
        mailer,
        config.service_config(),
    ));

    // Create the API router
    let state = AppState {
        service,
        pool,
        config: config.clone(),
    };
    let app = create_router(state);

    // Parse server address
    let addr: SocketAddr = config.server_addr().parse()?;

    tracing::info!(%addr, "Server listening");

    // Create TCP listener and serve
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Placeholder gateway until a processor adapter is wired in deployment
///
/// Refunds fail closed with a service-unavailable error, which leaves the
/// ledger untouched; everything else in the system keeps working.
struct UnconfiguredGateway;

impl DomainPort for UnconfiguredGateway {}

#[async_trait]
impl PaymentGateway for UnconfiguredGateway {
    async fn refund(&self, _amount: Money, _reference: &str) -> Result<(), PortError> {
        Err(PortError::unavailable("payment gateway not configured"))
    }
}

/// Loads API configuration from environment variables.
///
/// Falls back to individual environment variables, then defaults.
fn load_config() -> ApiConfig {
    ApiConfig::from_env().unwrap_or_else(|_| {
        let defaults = ApiConfig::default();
        ApiConfig {
            host: std::env::var("API_HOST").unwrap_or_else(|_| defaults.host.clone()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            database_url: std::env::var("DATABASE_URL")
                .or_else(|_| std::env::var("API_DATABASE_URL"))
                .unwrap_or_else(|_| defaults.database_url.clone()),
            public_origin: std::env::var("API_PUBLIC_ORIGIN")
                .unwrap_or_else(|_| defaults.public_origin.clone()),
            studio_name: std::env::var("API_STUDIO_NAME")
                .unwrap_or_else(|_| defaults.studio_name.clone()),
            log_level: std::env::var("API_LOG_LEVEL")
                .or_else(|_| std::env::var("RUST_LOG"))
                .unwrap_or_else(|_| defaults.log_level.clone()),
            ..defaults
        }
    })
}

/// Initializes the tracing subscriber for structured logging.
///
/// # Arguments
///
/// * `log_level` - The minimum log level to output (trace, debug, info, warn, error)
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// This enables graceful shutdown of the server, allowing in-flight
/// requests to complete before the process exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
