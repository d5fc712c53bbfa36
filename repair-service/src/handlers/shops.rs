use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use repair_core::error::AppError;
use validator::Validate;

use crate::{
    dtos::{CreateShopRequest, UpdateShopRequest},
    middleware::TenantContext,
    models::{new_id, Shop},
    services::{Filter, Sort},
    startup::AppState,
};

pub async fn list_shops(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<Vec<Shop>>, AppError> {
    let store = state.scoped(&tenant);
    Ok(Json(store.find(Filter::new(), Some(Sort::asc("shopName"))).await?))
}

pub async fn create_shop(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CreateShopRequest>,
) -> Result<(StatusCode, Json<Shop>), AppError> {
    payload.validate()?;

    let now = Utc::now();
    let shop = Shop {
        id: new_id(),
        shop_name: payload.shop_name,
        contact: payload.contact,
        address: payload.address,
        organization: tenant.org_id.clone(),
        created_at: now,
        updated_at: now,
    };

    state.scoped(&tenant).insert(&shop).await?;
    tracing::info!(shop_id = %shop.id, org_id = %tenant.org_id, "Shop created");

    Ok((StatusCode::CREATED, Json(shop)))
}

pub async fn update_shop(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(shop_id): Path<String>,
    Json(payload): Json<UpdateShopRequest>,
) -> Result<Json<Shop>, AppError> {
    payload.validate()?;

    let store = state.scoped(&tenant);
    let mut shop: Shop = store
        .find_by_id(&shop_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Shop not found")))?;

    if let Some(shop_name) = payload.shop_name {
        shop.shop_name = shop_name;
    }
    if let Some(contact) = payload.contact {
        shop.contact = Some(contact);
    }
    if let Some(address) = payload.address {
        shop.address = Some(address);
    }
    shop.updated_at = Utc::now();

    if !store.replace(Filter::new(), &shop).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Shop not found")));
    }
    Ok(Json(shop))
}
