//! Technicians are organization users with the Technician role. Login
//! credentials are managed by the identity provider, not here.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use repair_core::error::AppError;
use validator::Validate;

use crate::{
    dtos::{CreateTechnicianRequest, UpdateTechnicianRequest},
    middleware::TenantContext,
    models::{new_id, User, UserRole},
    services::{Filter, Sort},
    startup::AppState,
};

fn technicians() -> Filter {
    Filter::new().eq("role", UserRole::Technician.as_str())
}

pub async fn list_technicians(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<Vec<User>>, AppError> {
    let store = state.scoped(&tenant);
    Ok(Json(store.find(technicians(), Some(Sort::asc("name"))).await?))
}

pub async fn create_technician(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CreateTechnicianRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    payload.validate()?;
    let store = state.scoped(&tenant);

    if let Some(email) = &payload.email {
        let existing: Option<User> = store.find_one(Filter::new().eq("email", email.as_str())).await?;
        if existing.is_some() {
            return Err(AppError::Conflict(anyhow::anyhow!("User already exists")));
        }
    }

    let now = Utc::now();
    let technician = User {
        id: new_id(),
        name: payload.name,
        email: payload.email,
        role: UserRole::Technician,
        contact: payload.contact,
        address: payload.address,
        organization: tenant.org_id.clone(),
        created_at: now,
        updated_at: now,
    };

    store.insert(&technician).await?;
    tracing::info!(user_id = %technician.id, org_id = %tenant.org_id, "Technician created");

    Ok((StatusCode::CREATED, Json(technician)))
}

pub async fn update_technician(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(technician_id): Path<String>,
    Json(payload): Json<UpdateTechnicianRequest>,
) -> Result<Json<User>, AppError> {
    payload.validate()?;

    let store = state.scoped(&tenant);
    let mut technician: User = store
        .find_one(technicians().eq("_id", technician_id.as_str()))
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Technician not found")))?;

    if let Some(name) = payload.name {
        technician.name = name;
    }
    if let Some(contact) = payload.contact {
        technician.contact = Some(contact);
    }
    if let Some(address) = payload.address {
        technician.address = Some(address);
    }
    technician.updated_at = Utc::now();

    if !store.replace(Filter::new(), &technician).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Technician not found")));
    }
    Ok(Json(technician))
}
