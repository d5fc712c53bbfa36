use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{timestamp, Collection, Record};

/// Money received against a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(rename = "_id")]
    pub id: String,
    /// Internal id of the job this payment settles.
    pub job: String,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub profit: f64,
    pub organization: String,
    #[serde(default)]
    pub version: i64,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Record for Payment {
    const COLLECTION: Collection = Collection::Payments;

    fn id(&self) -> &str {
        &self.id
    }
}
