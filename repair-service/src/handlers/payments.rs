use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use repair_core::error::AppError;
use validator::Validate;

use crate::{
    dtos::{
        CreatePaymentRequest, PaymentQuery, PaymentReceipt, PaymentSummary, UpdatePaymentRequest,
    },
    middleware::TenantContext,
    services::{NewPayment, PaymentAmendment},
    startup::AppState,
};

pub async fn list_payments(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<PaymentQuery>,
) -> Result<Json<Vec<PaymentSummary>>, AppError> {
    let store = state.scoped(&tenant);
    let payments = state.ledger.list(&store, query.job.as_deref()).await?;
    Ok(Json(state.ledger.summarize(&store, payments).await?))
}

/// Record a payment; the response carries the re-settled job.
pub async fn create_payment(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<PaymentReceipt>), AppError> {
    payload.validate()?;
    tracing::info!(
        job_id = %payload.job,
        org_id = %tenant.org_id,
        amount = payload.amount,
        "Recording payment"
    );

    let store = state.scoped(&tenant);
    let input = NewPayment {
        job: payload.job,
        amount: payload.amount,
        date: payload.date.unwrap_or_else(|| Utc::now().date_naive()),
        profit: payload.profit,
    };
    let (payment, job) = state.ledger.record(&store, input).await?;
    Ok((StatusCode::CREATED, Json(PaymentReceipt { payment, job })))
}

pub async fn update_payment(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(payment_id): Path<String>,
    Json(payload): Json<UpdatePaymentRequest>,
) -> Result<Json<PaymentReceipt>, AppError> {
    tracing::info!(
        payment_id = %payment_id,
        org_id = %tenant.org_id,
        "Amending payment"
    );

    let store = state.scoped(&tenant);
    let amendment = PaymentAmendment {
        amount: payload.amount,
        date: payload.date,
        profit: payload.profit,
    };
    let (payment, job) = state.ledger.amend(&store, &payment_id, amendment).await?;
    Ok(Json(PaymentReceipt { payment, job }))
}
