use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use repair_core::error::AppError;
use validator::Validate;

use crate::{
    dtos::{CreateCustomerRequest, UpdateCustomerRequest},
    middleware::TenantContext,
    models::{new_id, Customer},
    services::{Filter, Sort},
    startup::AppState,
};

/// Customers of the organization, newest first.
pub async fn list_customers(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<Vec<Customer>>, AppError> {
    let store = state.scoped(&tenant);
    Ok(Json(store.find(Filter::new(), Some(Sort::desc("createdAt"))).await?))
}

pub async fn create_customer(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<Customer>), AppError> {
    payload.validate()?;

    let now = Utc::now();
    let customer = Customer {
        id: new_id(),
        name: payload.name,
        contact: payload.contact,
        address: payload.address,
        is_shopkeeper: payload.is_shopkeeper,
        organization: tenant.org_id.clone(),
        created_at: now,
        updated_at: now,
    };

    let store = state.scoped(&tenant);
    store.insert(&customer).await?;
    tracing::info!(customer_id = %customer.id, org_id = %tenant.org_id, "Customer created");

    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn update_customer(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(customer_id): Path<String>,
    Json(payload): Json<UpdateCustomerRequest>,
) -> Result<Json<Customer>, AppError> {
    payload.validate()?;

    let store = state.scoped(&tenant);
    let mut customer: Customer = store
        .find_by_id(&customer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found")))?;

    if let Some(name) = payload.name {
        customer.name = name;
    }
    if let Some(contact) = payload.contact {
        customer.contact = contact;
    }
    if let Some(address) = payload.address {
        customer.address = Some(address);
    }
    if let Some(is_shopkeeper) = payload.is_shopkeeper {
        customer.is_shopkeeper = is_shopkeeper;
    }
    customer.updated_at = Utc::now();

    if !store.replace(Filter::new(), &customer).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Customer not found")));
    }
    Ok(Json(customer))
}
