mod catalog;
mod jobs;
mod payments;

pub use catalog::*;
pub use jobs::*;
pub use payments::*;

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardFinancials {
    pub total_received: f64,
    pub total_profit: f64,
    pub total_expenses: f64,
    pub net_profit: f64,
}

/// Organization overview. Count maps are keyed by display name and only
/// contain values that occur.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub status_counts: BTreeMap<String, u64>,
    pub payment_status_counts: BTreeMap<String, u64>,
    pub financials: DashboardFinancials,
}
