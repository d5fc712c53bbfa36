//! Domain models for repair-service.
//!
//! Every model is stored as one document in its own collection and carries
//! the owning `organization`. Field names are camelCase both at rest and on
//! the wire.

mod customer;
mod expense;
mod job;
mod payment;
mod shop;
mod spare_part;
mod user;

pub use customer::Customer;
pub use expense::{Expense, ExpenseCategory, PaymentMethod};
pub use job::{Device, Financials, Job, JobStatus, PaymentStatus, RepairDetails};
pub use payment::Payment;
pub use shop::Shop;
pub use spare_part::SparePart;
pub use user::{User, UserRole};

use serde::{de::DeserializeOwned, Serialize};

/// Collections owned by this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Jobs,
    Payments,
    SpareParts,
    Customers,
    Users,
    Shops,
    Expenses,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::Jobs,
        Collection::Payments,
        Collection::SpareParts,
        Collection::Customers,
        Collection::Users,
        Collection::Shops,
        Collection::Expenses,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Jobs => "jobs",
            Collection::Payments => "payments",
            Collection::SpareParts => "spare_parts",
            Collection::Customers => "customers",
            Collection::Users => "users",
            Collection::Shops => "shops",
            Collection::Expenses => "expenses",
        }
    }
}

/// A tenant-owned document persisted in a single collection.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;

    fn id(&self) -> &str;
}

/// Generate a new record identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// RFC 3339 timestamps with a fixed millisecond width, so lexical order at
/// rest matches chronological order.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
