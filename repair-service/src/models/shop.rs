use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{timestamp, Collection, Record};

/// Supplier the organization buys spare parts from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    #[serde(rename = "_id")]
    pub id: String,
    pub shop_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub organization: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Record for Shop {
    const COLLECTION: Collection = Collection::Shops;

    fn id(&self) -> &str {
        &self.id
    }
}
