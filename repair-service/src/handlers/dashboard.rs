use axum::{extract::State, Json};
use repair_core::error::AppError;

use crate::{
    dtos::DashboardResponse, middleware::TenantContext, services::dashboard, startup::AppState,
};

pub async fn get_dashboard(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<DashboardResponse>, AppError> {
    let store = state.scoped(&tenant);
    Ok(Json(dashboard::summarize(&store).await?))
}
