use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Job, JobStatus, PaymentStatus, RepairDetails};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInput {
    #[validate(length(min = 1, message = "Device model is required"))]
    pub model: String,

    #[validate(length(min = 1, message = "Problem description is required"))]
    pub problem: String,

    pub imei: Option<String>,
    pub image: Option<String>,
}

/// Client-editable financial inputs. Received totals, balance and payment
/// status are derived server side and ignored if sent.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FinancialsInput {
    #[validate(range(min = 0.0, message = "repairingCharges must not be negative"))]
    pub repairing_charges: Option<f64>,

    #[validate(range(min = 0.0, message = "discount must not be negative"))]
    pub discount: Option<f64>,

    #[validate(range(min = 0.0, message = "totalSpareCost must not be negative"))]
    pub total_spare_cost: Option<f64>,
}

/// Part bought specifically for a job and created together with it.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewPartInput {
    #[validate(length(min = 1, message = "Part name is required"))]
    pub part_name: String,

    #[validate(length(min = 1, message = "Shop is required"))]
    pub shop: String,

    #[validate(range(exclusive_min = 0.0, message = "Part cost must be positive"))]
    pub cost: f64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    #[validate(length(min = 1, message = "Customer is required"))]
    pub customer: String,

    #[validate(nested)]
    pub device: DeviceInput,

    #[serde(default)]
    pub repair_details: RepairDetails,

    #[serde(default)]
    #[validate(nested)]
    pub financials: FinancialsInput,

    pub status: Option<JobStatus>,

    #[serde(default)]
    #[validate(nested)]
    pub new_parts: Vec<NewPartInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicePatch {
    pub model: Option<String>,
    pub problem: Option<String>,
    pub imei: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairDetailsPatch {
    pub technician: Option<String>,
    pub components: Option<Vec<String>>,
    pub remark: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobRequest {
    pub status: Option<JobStatus>,
    pub device: Option<DevicePatch>,
    pub repair_details: Option<RepairDetailsPatch>,

    #[validate(nested)]
    pub financials: Option<FinancialsInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateJobStatusRequest {
    pub status: JobStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobQuery {
    pub status: Option<JobStatus>,
    pub technician: Option<String>,
    pub customer: Option<String>,
    pub payment_status: Option<PaymentStatus>,
}

/// Job row of the listing, with the names its references point at.
/// Dangling references leave the names out.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    #[serde(flatten)]
    pub job: Job,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technician_name: Option<String>,
}
