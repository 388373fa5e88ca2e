//! Public payment-page handler
//!
//! Bearer-token access: possession of the payment token is the credential,
//! so this route sits outside the admin API and performs no other checks.

use axum::{
    extract::{Path, State},
    Json,
};

use core_kernel::PaymentToken;

use crate::dto::invoices::PublicInvoiceResponse;
use crate::{error::ApiError, AppState};

/// Looks up the invoice behind a payment token, reconciled
pub async fn get_by_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<PublicInvoiceResponse>, ApiError> {
    let token = PaymentToken::from_string(token);
    let invoice = state.service.get_invoice_by_token(&token).await?;

    Ok(Json(invoice.into()))
}
