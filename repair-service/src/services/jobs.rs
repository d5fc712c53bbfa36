//! Repair job lifecycle.

use chrono::{DateTime, Utc};

use super::error::RepairError;
use super::metrics::{JOBS_CREATED_TOTAL, ROLLBACKS_TOTAL};
use super::reconciliation;
use super::retry::RetryPolicy;
use super::store::{Filter, Sort, TenantStore};
use crate::dtos::{CreateJobRequest, FinancialsInput, JobQuery, JobSummary, UpdateJobRequest};
use crate::models::{new_id, Customer, Device, Financials, Job, JobStatus, SparePart, User};

/// Ticket code from the last six digits of the epoch milliseconds. Two jobs
/// created in the same millisecond, or 1000 seconds apart, share a code.
pub fn job_code(at: DateTime<Utc>) -> String {
    format!("JOB-{:06}", at.timestamp_millis().rem_euclid(1_000_000))
}

fn check_financials(input: &FinancialsInput) -> Result<(), RepairError> {
    let fields = [
        ("repairingCharges", input.repairing_charges),
        ("discount", input.discount),
        ("totalSpareCost", input.total_spare_cost),
    ];
    for (name, value) in fields {
        if let Some(value) = value {
            reconciliation::require_non_negative(name, value)
                .and_then(|()| reconciliation::require_cents(name, value))
                .map_err(RepairError::Validation)?;
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JobService {
    retry: RetryPolicy,
}

impl JobService {
    pub fn new(retry: RetryPolicy) -> Self {
        Self { retry }
    }

    /// Create a job and its ad-hoc parts as one unit. If any insert fails the
    /// whole unit is rolled back and the caller may resubmit unchanged.
    pub async fn create(&self, store: &TenantStore, request: CreateJobRequest) -> Result<Job, RepairError> {
        check_financials(&request.financials)?;
        for part in &request.new_parts {
            reconciliation::require_positive("cost", part.cost)
                .and_then(|()| reconciliation::require_cents("cost", part.cost))
                .map_err(RepairError::Validation)?;
        }

        let now = Utc::now();
        let org_id = store.org_id().to_string();

        let mut financials = Financials {
            repairing_charges: request.financials.repairing_charges.unwrap_or_default(),
            discount: request.financials.discount.unwrap_or_default(),
            total_spare_cost: request.financials.total_spare_cost.unwrap_or_default(),
            ..Financials::default()
        };
        let payment_status = reconciliation::recompute(&mut financials);

        let job = Job {
            id: new_id(),
            job_id: job_code(now),
            customer: request.customer,
            device: Device {
                model: request.device.model,
                problem: request.device.problem,
                imei: request.device.imei,
                image: request.device.image,
            },
            repair_details: request.repair_details,
            financials,
            status: request.status.unwrap_or_default(),
            payment_status,
            organization: org_id.clone(),
            version: 0,
            created_at: now,
            updated_at: now,
        };

        let parts: Vec<SparePart> = request
            .new_parts
            .into_iter()
            .map(|part| SparePart {
                id: new_id(),
                part_name: part.part_name,
                shop: part.shop,
                cost: part.cost,
                is_paid: false,
                linked_job: Some(job.id.clone()),
                organization: org_id.clone(),
                created_at: now,
                updated_at: now,
            })
            .collect();

        let mut uow = store.begin().await?;
        let mut written = Ok(());
        if let Err(e) = uow.insert(&job).await {
            written = Err(e);
        } else {
            for part in &parts {
                if let Err(e) = uow.insert(part).await {
                    written = Err(e);
                    break;
                }
            }
        }
        let outcome = match written {
            Ok(()) => uow.commit().await,
            Err(e) => {
                if let Err(abort_err) = uow.abort().await {
                    tracing::warn!(job_id = %job.id, error = %abort_err, "Failed to abort job creation");
                }
                Err(e)
            }
        };

        if let Err(e) = outcome {
            ROLLBACKS_TOTAL.with_label_values(&["create_job"]).inc();
            tracing::error!(job_id = %job.id, org_id = %org_id, error = %e, "Job creation rolled back");
            return Err(RepairError::Consistency(e));
        }

        JOBS_CREATED_TOTAL
            .with_label_values(&[if parts.is_empty() { "false" } else { "true" }])
            .inc();
        tracing::info!(
            job_id = %job.id,
            job_code = %job.job_id,
            org_id = %org_id,
            parts = parts.len(),
            "Job created"
        );
        Ok(job)
    }

    pub async fn get(&self, store: &TenantStore, id: &str) -> Result<Job, RepairError> {
        store
            .find_by_id(id)
            .await?
            .ok_or(RepairError::NotFound("Job"))
    }

    /// Jobs of the organization, newest first.
    pub async fn list(&self, store: &TenantStore, query: &JobQuery) -> Result<Vec<Job>, RepairError> {
        let mut filter = Filter::new();
        if let Some(status) = query.status {
            filter = filter.eq("status", status.as_str());
        }
        if let Some(technician) = &query.technician {
            filter = filter.eq("repairDetails.technician", technician.as_str());
        }
        if let Some(customer) = &query.customer {
            filter = filter.eq("customer", customer.as_str());
        }
        if let Some(payment_status) = query.payment_status {
            filter = filter.eq("paymentStatus", payment_status.as_str());
        }
        Ok(store.find(filter, Some(Sort::desc("createdAt"))).await?)
    }

    /// Attach customer and technician names to listed jobs.
    pub async fn summarize(&self, store: &TenantStore, jobs: Vec<Job>) -> Result<Vec<JobSummary>, RepairError> {
        let customers = store
            .find_by_ids::<Customer>(jobs.iter().map(|job| job.customer.as_str()).collect::<Vec<&str>>())
            .await?;
        let technicians = store
            .find_by_ids::<User>(jobs.iter().filter_map(|job| job.repair_details.technician.as_deref()).collect::<Vec<&str>>())
            .await?;

        Ok(jobs
            .into_iter()
            .map(|job| {
                let customer = customers.get(&job.customer);
                let technician_name = job
                    .repair_details
                    .technician
                    .as_ref()
                    .and_then(|id| technicians.get(id))
                    .map(|user| user.name.clone());
                JobSummary {
                    customer_name: customer.map(|c| c.name.clone()),
                    customer_contact: customer.map(|c| c.contact.clone()),
                    technician_name,
                    job,
                }
            })
            .collect())
    }

    /// Patch a job. Financial inputs go through reconciliation; received
    /// totals and payment status are never taken from the request.
    pub async fn update(&self, store: &TenantStore, id: &str, request: UpdateJobRequest) -> Result<Job, RepairError> {
        if let Some(financials) = &request.financials {
            check_financials(financials)?;
        }
        let request = &request;
        self.retry
            .run("update_job", || async move {
                Self::replace_with(store, id, |job| apply_patch(job, request)).await
            })
            .await
    }

    pub async fn update_status(&self, store: &TenantStore, id: &str, status: JobStatus) -> Result<Job, RepairError> {
        let job = self
            .retry
            .run("update_job_status", || async move {
                Self::replace_with(store, id, |job| job.status = status).await
            })
            .await?;
        tracing::info!(job_id = %job.id, status = status.as_str(), "Job status updated");
        Ok(job)
    }

    /// One versioned read-modify-write of a job.
    async fn replace_with<F>(store: &TenantStore, id: &str, mutate: F) -> Result<Job, RepairError>
    where
        F: FnOnce(&mut Job),
    {
        let current: Job = store
            .find_by_id(id)
            .await?
            .ok_or(RepairError::NotFound("Job"))?;

        let mut next = current.clone();
        mutate(&mut next);
        next.payment_status = reconciliation::recompute(&mut next.financials);
        next.version = current.version + 1;
        next.updated_at = Utc::now();

        let guard = Filter::new().eq("version", current.version);
        if !store.replace(guard, &next).await? {
            return Err(RepairError::Conflict(format!("job {}", current.id)));
        }
        Ok(next)
    }
}

fn apply_patch(job: &mut Job, request: &UpdateJobRequest) {
    if let Some(status) = request.status {
        job.status = status;
    }
    if let Some(device) = &request.device {
        if let Some(model) = non_empty(&device.model) {
            job.device.model = model;
        }
        if let Some(problem) = non_empty(&device.problem) {
            job.device.problem = problem;
        }
        if let Some(imei) = non_empty(&device.imei) {
            job.device.imei = Some(imei);
        }
        if let Some(image) = non_empty(&device.image) {
            job.device.image = Some(image);
        }
    }
    if let Some(details) = &request.repair_details {
        if let Some(technician) = non_empty(&details.technician) {
            job.repair_details.technician = Some(technician);
        }
        if let Some(remark) = non_empty(&details.remark) {
            job.repair_details.remark = Some(remark);
        }
        if let Some(components) = &details.components {
            job.repair_details.components = components.clone();
        }
    }
    if let Some(financials) = &request.financials {
        if let Some(charges) = financials.repairing_charges {
            job.financials.repairing_charges = charges;
        }
        if let Some(discount) = financials.discount {
            job.financials.discount = discount;
        }
        if let Some(spare) = financials.total_spare_cost {
            job.financials.total_spare_cost = spare;
        }
    }
}

/// Empty strings from form posts mean "leave unchanged".
fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}
