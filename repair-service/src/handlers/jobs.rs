use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use repair_core::error::AppError;
use validator::Validate;

use crate::{
    dtos::{CreateJobRequest, JobQuery, JobSummary, UpdateJobRequest, UpdateJobStatusRequest},
    middleware::TenantContext,
    models::Job,
    startup::AppState,
};

pub async fn list_jobs(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<JobQuery>,
) -> Result<Json<Vec<JobSummary>>, AppError> {
    let store = state.scoped(&tenant);
    let jobs = state.jobs.list(&store, &query).await?;
    Ok(Json(state.jobs.summarize(&store, jobs).await?))
}

/// Create a job, with any ad-hoc parts, as a single unit.
pub async fn create_job(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    payload.validate()?;
    let store = state.scoped(&tenant);
    let job = state.jobs.create(&store, payload).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn get_job(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(job_id): Path<String>,
) -> Result<Json<Job>, AppError> {
    let store = state.scoped(&tenant);
    Ok(Json(state.jobs.get(&store, &job_id).await?))
}

pub async fn update_job(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(job_id): Path<String>,
    Json(payload): Json<UpdateJobRequest>,
) -> Result<Json<Job>, AppError> {
    payload.validate()?;
    tracing::info!(job_id = %job_id, org_id = %tenant.org_id, "Updating job");

    let store = state.scoped(&tenant);
    Ok(Json(state.jobs.update(&store, &job_id, payload).await?))
}

pub async fn update_job_status(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(job_id): Path<String>,
    Json(payload): Json<UpdateJobStatusRequest>,
) -> Result<Json<Job>, AppError> {
    let store = state.scoped(&tenant);
    Ok(Json(
        state
            .jobs
            .update_status(&store, &job_id, payload.status)
            .await?,
    ))
}
