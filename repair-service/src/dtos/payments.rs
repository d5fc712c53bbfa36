use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Job, Payment};

/// Amount checks happen in the ledger so every entry point shares them.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    #[serde(alias = "jobId")]
    #[validate(length(min = 1, message = "Job is required"))]
    pub job: String,

    pub amount: f64,

    /// Defaults to today (UTC).
    pub date: Option<NaiveDate>,

    #[serde(default)]
    pub profit: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentRequest {
    pub amount: Option<f64>,
    pub date: Option<NaiveDate>,
    pub profit: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentQuery {
    pub job: Option<String>,
}

/// A written payment together with the job totals it produced.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub job: Job,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    #[serde(flatten)]
    pub payment: Payment,
    /// Ticket code of the settled job.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
}
