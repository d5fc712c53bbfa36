//! Organization staff accounts. Only admins manage them; login credentials
//! are handled by the identity provider.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use repair_core::error::AppError;
use serde_json::{json, Value};
use validator::Validate;

use crate::{
    dtos::{CreateUserRequest, UpdateUserRequest},
    middleware::TenantContext,
    models::{new_id, User, UserRole},
    services::{Filter, Sort, TenantStore},
    startup::AppState,
};

const USER_ADMINS: &[UserRole] = &[UserRole::Superadmin, UserRole::Admin];

async fn email_taken(store: &TenantStore, email: &str) -> Result<bool, AppError> {
    let existing: Option<User> = store.find_one(Filter::new().eq("email", email)).await?;
    Ok(existing.is_some())
}

pub async fn list_users(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<Vec<User>>, AppError> {
    tenant.require_role(USER_ADMINS)?;
    let store = state.scoped(&tenant);
    Ok(Json(store.find(Filter::new(), Some(Sort::desc("createdAt"))).await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    tenant.require_role(USER_ADMINS)?;
    payload.validate()?;

    let store = state.scoped(&tenant);
    if email_taken(&store, &payload.email).await? {
        return Err(AppError::Conflict(anyhow::anyhow!("User already exists")));
    }

    let now = Utc::now();
    let user = User {
        id: new_id(),
        name: payload.name,
        email: Some(payload.email),
        role: payload.role.unwrap_or_default(),
        contact: payload.contact,
        address: payload.address,
        organization: tenant.org_id.clone(),
        created_at: now,
        updated_at: now,
    };

    store.insert(&user).await?;
    tracing::info!(
        user_id = %user.id,
        org_id = %tenant.org_id,
        role = user.role.as_str(),
        "User created"
    );

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(user_id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, AppError> {
    tenant.require_role(USER_ADMINS)?;
    payload.validate()?;

    let store = state.scoped(&tenant);
    let mut user: User = store
        .find_by_id(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    if let Some(email) = payload.email {
        if user.email.as_deref() != Some(email.as_str()) && email_taken(&store, &email).await? {
            return Err(AppError::Conflict(anyhow::anyhow!("User already exists")));
        }
        user.email = Some(email);
    }
    if let Some(name) = payload.name {
        user.name = name;
    }
    if let Some(role) = payload.role {
        user.role = role;
    }
    if let Some(contact) = payload.contact {
        user.contact = Some(contact);
    }
    if let Some(address) = payload.address {
        user.address = Some(address);
    }
    user.updated_at = Utc::now();

    if !store.replace(Filter::new(), &user).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("User not found")));
    }
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    tenant.require_role(USER_ADMINS)?;

    let store = state.scoped(&tenant);
    if !store.delete::<User>(&user_id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("User not found")));
    }
    tracing::info!(user_id = %user_id, org_id = %tenant.org_id, "User removed");
    Ok(Json(json!({ "message": "User removed" })))
}
