use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{timestamp, Collection, Record};

/// A part bought from a shop, optionally fitted to a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparePart {
    #[serde(rename = "_id")]
    pub id: String,
    pub part_name: String,
    pub shop: String,
    pub cost: f64,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_job: Option<String>,
    pub organization: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Record for SparePart {
    const COLLECTION: Collection = Collection::SpareParts;

    fn id(&self) -> &str {
        &self.id
    }
}
