//! Repair job (work order) aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{timestamp, Collection, Record};

/// Lifecycle status of a repair job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum JobStatus {
    #[default]
    Received,
    Repairing,
    Repaired,
    #[serde(rename = "Not Repaired")]
    NotRepaired,
    #[serde(rename = "Repaired Picked up")]
    RepairedPickedUp,
    #[serde(rename = "Not Repaired Picked up")]
    NotRepairedPickedUp,
    #[serde(rename = "Repair Picked Unpaid")]
    RepairPickedUnpaid,
    Return,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Received => "Received",
            JobStatus::Repairing => "Repairing",
            JobStatus::Repaired => "Repaired",
            JobStatus::NotRepaired => "Not Repaired",
            JobStatus::RepairedPickedUp => "Repaired Picked up",
            JobStatus::NotRepairedPickedUp => "Not Repaired Picked up",
            JobStatus::RepairPickedUnpaid => "Repair Picked Unpaid",
            JobStatus::Return => "Return",
        }
    }
}

/// Settlement state derived from a job's financials. Never set by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    #[serde(rename = "Partially Paid")]
    PartiallyPaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "Unpaid",
            PaymentStatus::PartiallyPaid => "Partially Paid",
            PaymentStatus::Paid => "Paid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub model: String,
    pub problem: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imei: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RepairDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technician: Option<String>,
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
}

/// Money block embedded in a job. `total_received` and `balance_amount` are
/// only ever written by reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Financials {
    #[serde(default)]
    pub repairing_charges: f64,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub total_spare_cost: f64,
    #[serde(default)]
    pub total_received: f64,
    #[serde(default)]
    pub balance_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(rename = "_id")]
    pub id: String,
    /// Human-readable code shown on tickets, e.g. `JOB-482913`.
    pub job_id: String,
    pub customer: String,
    pub device: Device,
    #[serde(default)]
    pub repair_details: RepairDetails,
    #[serde(default)]
    pub financials: Financials,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    pub organization: String,
    /// Optimistic concurrency token, bumped on every write.
    #[serde(default)]
    pub version: i64,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Record for Job {
    const COLLECTION: Collection = Collection::Jobs;

    fn id(&self) -> &str {
        &self.id
    }
}
