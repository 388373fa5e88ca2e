//! Admin invoice handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{InvoiceId, Money, SessionId};
use domain_invoicing::{InvoiceQuery, InvoiceSort, InvoiceStatus};

use crate::dto::invoices::*;
use crate::{error::ApiError, AppState};

/// Creates a new invoice and emails the client their payment link
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<Json<CreateInvoiceResponse>, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let outcome = state.service.create_invoice(request.into_domain()).await?;

    Ok(Json(CreateInvoiceResponse {
        invoice: InvoiceResponse::from_domain(outcome.invoice, &state.config.public_origin),
        notification: outcome.notification.into(),
    }))
}

/// Lists invoices from the persisted snapshot
pub async fn list_invoices(
    State(state): State<AppState>,
    Query(params): Query<ListInvoicesParams>,
) -> Result<Json<Vec<InvoiceResponse>>, ApiError> {
    let query = build_query(params)?;
    let invoices = state.service.list_invoices(&query).await?;

    Ok(Json(
        invoices
            .into_iter()
            .map(|invoice| InvoiceResponse::from_domain(invoice, &state.config.public_origin))
            .collect(),
    ))
}

/// Gets one invoice with derived fields reconciled from the ledger
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice = state.service.get_invoice(InvoiceId::from_uuid(id)).await?;

    Ok(Json(InvoiceResponse::from_domain(
        invoice,
        &state.config.public_origin,
    )))
}

/// Records a payment against an invoice
pub async fn record_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<Json<RecordPaymentResponse>, ApiError> {
    let invoice_id = InvoiceId::from_uuid(id);
    let currency = state
        .service
        .get_invoice(invoice_id)
        .await?
        .total_amount
        .currency();

    let outcome = state
        .service
        .record_payment(
            invoice_id,
            Money::new(request.amount, currency),
            request.method,
            request.notes,
        )
        .await?;

    Ok(Json(RecordPaymentResponse {
        invoice: InvoiceResponse::from_domain(outcome.invoice, &state.config.public_origin),
        entry: outcome.entry.into(),
        notification: outcome.notification.into(),
    }))
}

/// Refunds part or all of what has been paid
pub async fn refund(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RefundRequest>,
) -> Result<Json<RefundResponse>, ApiError> {
    let invoice_id = InvoiceId::from_uuid(id);
    let currency = state
        .service
        .get_invoice(invoice_id)
        .await?
        .total_amount
        .currency();

    let outcome = state
        .service
        .refund(invoice_id, Money::new(request.amount, currency), request.reason)
        .await?;

    Ok(Json(RefundResponse {
        invoice: InvoiceResponse::from_domain(outcome.invoice, &state.config.public_origin),
        entry: outcome.entry.into(),
    }))
}

/// Builds a payment link for the outstanding balance or a custom amount
pub async fn request_payment_link(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<PaymentLinkRequest>,
) -> Result<Json<PaymentLinkResponse>, ApiError> {
    let invoice_id = InvoiceId::from_uuid(id);
    let currency = state
        .service
        .get_invoice(invoice_id)
        .await?
        .total_amount
        .currency();

    let outcome = state
        .service
        .request_payment_link(
            invoice_id,
            request.amount.map(|a| Money::new(a, currency)),
            request.send_email,
        )
        .await?;

    Ok(Json(PaymentLinkResponse {
        url: outcome.url,
        amount: outcome.amount.amount(),
        notification: outcome.notification.map(Into::into),
    }))
}

/// Administratively voids an invoice
pub async fn void_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice = state.service.void_invoice(InvoiceId::from_uuid(id)).await?;

    Ok(Json(InvoiceResponse::from_domain(
        invoice,
        &state.config.public_origin,
    )))
}

fn build_query(params: ListInvoicesParams) -> Result<InvoiceQuery, ApiError> {
    let status = params
        .status
        .as_deref()
        .map(|s| {
            s.parse::<InvoiceStatus>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))
        })
        .transpose()?;

    let sort = match params.sort.as_deref() {
        None | Some("issued_desc") => InvoiceSort::IssuedDesc,
        Some("issued_asc") => InvoiceSort::IssuedAsc,
        Some("due_date_asc") => InvoiceSort::DueDateAsc,
        Some(other) => {
            return Err(ApiError::BadRequest(format!("unknown sort: {}", other)));
        }
    };

    Ok(InvoiceQuery {
        status,
        client_email: params.client_email,
        session_id: params.session_id.map(SessionId::from_uuid),
        sort,
        limit: params.limit,
        offset: params.offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_query_parses_status_and_sort() {
        let query = build_query(ListInvoicesParams {
            status: Some("partial_paid".to_string()),
            sort: Some("due_date_asc".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(query.status, Some(InvoiceStatus::PartialPaid));
        assert_eq!(query.sort, InvoiceSort::DueDateAsc);
    }

    #[test]
    fn test_build_query_rejects_unknown_status() {
        let result = build_query(ListInvoicesParams {
            status: Some("archived".to_string()),
            ..Default::default()
        });

        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_build_query_rejects_unknown_sort() {
        let result = build_query(ListInvoicesParams {
            sort: Some("alphabetical".to_string()),
            ..Default::default()
        });

        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }
}
