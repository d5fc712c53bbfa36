use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use repair_core::error::AppError;
use validator::Validate;

use crate::{
    dtos::{CreateExpenseRequest, UpdateExpenseRequest},
    middleware::TenantContext,
    models::{new_id, Expense},
    services::{Filter, Sort},
    startup::AppState,
};

pub async fn list_expenses(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<Vec<Expense>>, AppError> {
    let store = state.scoped(&tenant);
    Ok(Json(store.find(Filter::new(), Some(Sort::desc("createdAt"))).await?))
}

pub async fn create_expense(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    payload.validate()?;

    let now = Utc::now();
    let expense = Expense {
        id: new_id(),
        category: payload.category,
        expense_name: payload.expense_name,
        amount: payload.amount,
        payment_method: payload.payment_method,
        paid_by: payload.paid_by,
        vendor_name: payload.vendor_name,
        description: payload.description,
        organization: tenant.org_id.clone(),
        created_at: now,
        updated_at: now,
    };

    state.scoped(&tenant).insert(&expense).await?;
    tracing::info!(
        expense_id = %expense.id,
        org_id = %tenant.org_id,
        amount = expense.amount,
        "Expense recorded"
    );

    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn update_expense(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(expense_id): Path<String>,
    Json(payload): Json<UpdateExpenseRequest>,
) -> Result<Json<Expense>, AppError> {
    payload.validate()?;

    let store = state.scoped(&tenant);
    let mut expense: Expense = store
        .find_by_id(&expense_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Expense not found")))?;

    if let Some(category) = payload.category {
        expense.category = category;
    }
    if let Some(expense_name) = payload.expense_name {
        expense.expense_name = expense_name;
    }
    if let Some(amount) = payload.amount {
        expense.amount = amount;
    }
    if let Some(payment_method) = payload.payment_method {
        expense.payment_method = payment_method;
    }
    if let Some(paid_by) = payload.paid_by {
        expense.paid_by = Some(paid_by);
    }
    if let Some(vendor_name) = payload.vendor_name {
        expense.vendor_name = Some(vendor_name);
    }
    if let Some(description) = payload.description {
        expense.description = Some(description);
    }
    expense.updated_at = Utc::now();

    if !store.replace(Filter::new(), &expense).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Expense not found")));
    }
    Ok(Json(expense))
}
