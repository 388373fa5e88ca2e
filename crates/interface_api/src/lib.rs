//! HTTP API Layer
//!
//! This crate provides the REST API for the studio billing core using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: admin invoice operations and the public pay-link lookup
//! - **Middleware**: request audit logging and HTTP tracing
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses
//!
//! Authentication sits in front of this service (reverse proxy / session
//! layer of the site); the public `/pay/:token` route is deliberately
//! unauthenticated because the token itself is the credential.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_invoicing::InvoicingService;

use crate::config::ApiConfig;
use crate::handlers::{health, invoices, pay};
use crate::middleware::audit_middleware;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<InvoicingService>,
    pub pool: PgPool,
    pub config: ApiConfig,
}

/// Creates the main API router
///
/// # Arguments
///
/// * `state` - Shared application state
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Public routes: health plus the bearer-token payment page
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/pay/:token", get(pay::get_by_token));

    // Invoice routes
    let invoice_routes = Router::new()
        .route("/", post(invoices::create_invoice))
        .route("/", get(invoices::list_invoices))
        .route("/:id", get(invoices::get_invoice))
        .route("/:id/payments", post(invoices::record_payment))
        .route("/:id/refunds", post(invoices::refund))
        .route("/:id/payment-link", post(invoices::request_payment_link))
        .route("/:id/void", post(invoices::void_invoice));

    // Admin API routes
    let api_routes = Router::new()
        .nest("/invoices", invoice_routes)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            audit_middleware,
        ));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
