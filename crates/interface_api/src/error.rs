//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use domain_invoicing::InvoicingError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream gateway error: {0}")]
    BadGateway(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg.clone())
            }
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "bad_gateway", msg.clone()),
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<InvoicingError> for ApiError {
    fn from(error: InvoicingError) -> Self {
        match error {
            InvoicingError::Validation(msg) => ApiError::Validation(msg),
            InvoicingError::AmountOutOfRange { .. }
            | InvoicingError::RefundExceedsPayments { .. }
            | InvoicingError::Money(_) => ApiError::Validation(error.to_string()),
            InvoicingError::InvoiceNotFound(msg) => ApiError::NotFound(msg),
            InvoicingError::InvoiceVoided(_) => ApiError::Conflict(error.to_string()),
            InvoicingError::Gateway(msg) => ApiError::BadGateway(msg),
            InvoicingError::LedgerIntegrity(msg) => ApiError::Internal(msg),
            InvoicingError::Store(port) => {
                if port.is_not_found() {
                    ApiError::NotFound(port.to_string())
                } else {
                    ApiError::Internal(port.to_string())
                }
            }
        }
    }
}
