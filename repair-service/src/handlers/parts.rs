use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use repair_core::error::AppError;
use validator::Validate;

use crate::{
    dtos::{CreatePartRequest, UpdatePartRequest},
    middleware::TenantContext,
    models::{new_id, Job, Shop, SparePart},
    services::{reconciliation, Filter, Sort, TenantStore},
    startup::AppState,
};

/// A part may only point at a shop, and a job, of the caller's organization.
async fn check_references(
    store: &TenantStore,
    shop: Option<&str>,
    linked_job: Option<&str>,
) -> Result<(), AppError> {
    if let Some(shop) = shop {
        if store.find_by_id::<Shop>(shop).await?.is_none() {
            return Err(AppError::NotFound(anyhow::anyhow!("Shop not found")));
        }
    }
    if let Some(job) = linked_job {
        if store.find_by_id::<Job>(job).await?.is_none() {
            return Err(AppError::NotFound(anyhow::anyhow!("Job not found")));
        }
    }
    Ok(())
}

fn check_cost(cost: f64) -> Result<(), AppError> {
    reconciliation::require_cents("cost", cost)
        .map_err(|message| AppError::BadRequest(anyhow::anyhow!(message)))
}

pub async fn list_parts(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<Vec<SparePart>>, AppError> {
    let store = state.scoped(&tenant);
    Ok(Json(store.find(Filter::new(), Some(Sort::asc("partName"))).await?))
}

pub async fn create_part(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CreatePartRequest>,
) -> Result<(StatusCode, Json<SparePart>), AppError> {
    payload.validate()?;
    check_cost(payload.cost)?;

    let store = state.scoped(&tenant);
    check_references(&store, Some(payload.shop.as_str()), payload.linked_job.as_deref()).await?;

    let now = Utc::now();
    let part = SparePart {
        id: new_id(),
        part_name: payload.part_name,
        shop: payload.shop,
        cost: payload.cost,
        is_paid: payload.is_paid,
        linked_job: payload.linked_job,
        organization: tenant.org_id.clone(),
        created_at: now,
        updated_at: now,
    };

    store.insert(&part).await?;
    tracing::info!(part_id = %part.id, org_id = %tenant.org_id, cost = part.cost, "Spare part created");

    Ok((StatusCode::CREATED, Json(part)))
}

pub async fn update_part(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(part_id): Path<String>,
    Json(payload): Json<UpdatePartRequest>,
) -> Result<Json<SparePart>, AppError> {
    payload.validate()?;
    if let Some(cost) = payload.cost {
        check_cost(cost)?;
    }

    let store = state.scoped(&tenant);
    check_references(&store, payload.shop.as_deref(), payload.linked_job.as_deref()).await?;
    let mut part: SparePart = store
        .find_by_id(&part_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Spare part not found")))?;

    if let Some(part_name) = payload.part_name {
        part.part_name = part_name;
    }
    if let Some(shop) = payload.shop {
        part.shop = shop;
    }
    if let Some(cost) = payload.cost {
        part.cost = cost;
    }
    if let Some(is_paid) = payload.is_paid {
        part.is_paid = is_paid;
    }
    if let Some(linked_job) = payload.linked_job {
        part.linked_job = Some(linked_job);
    }
    part.updated_at = Utc::now();

    if !store.replace(Filter::new(), &part).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Spare part not found")));
    }
    Ok(Json(part))
}
