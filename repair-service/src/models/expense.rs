use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{timestamp, Collection, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpenseCategory {
    #[serde(rename = "Spare Part")]
    SparePart,
    Party,
    #[serde(rename = "Shop Maintenance")]
    ShopMaintenance,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PaymentMethod {
    #[serde(rename = "UPI")]
    Upi,
    #[default]
    Cash,
    #[serde(rename = "Debit Card/Credit Card")]
    Card,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(rename = "_id")]
    pub id: String,
    pub category: ExpenseCategory,
    pub expense_name: String,
    pub amount: f64,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    /// Staff member who paid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub organization: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Record for Expense {
    const COLLECTION: Collection = Collection::Expenses;

    fn id(&self) -> &str {
        &self.id
    }
}
