//! Request bodies for the plain master-data resources.

use serde::Deserialize;
use validator::Validate;

use crate::models::{ExpenseCategory, PaymentMethod, UserRole};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Contact is required"))]
    pub contact: String,

    pub address: Option<String>,

    #[serde(default)]
    pub is_shopkeeper: bool,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: Option<String>,

    #[validate(length(min = 1, message = "Contact must not be empty"))]
    pub contact: Option<String>,

    pub address: Option<String>,
    pub is_shopkeeper: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTechnicianRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub contact: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTechnicianRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: Option<String>,

    pub contact: Option<String>,
    pub address: Option<String>,
}

/// Organization staff account. Credentials are issued elsewhere.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub role: Option<UserRole>,
    pub contact: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub role: Option<UserRole>,
    pub contact: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateShopRequest {
    #[validate(length(min = 1, message = "Shop name is required"))]
    pub shop_name: String,

    pub contact: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShopRequest {
    #[validate(length(min = 1, message = "Shop name must not be empty"))]
    pub shop_name: Option<String>,

    pub contact: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePartRequest {
    #[validate(length(min = 1, message = "Part name is required"))]
    pub part_name: String,

    #[validate(length(min = 1, message = "Shop is required"))]
    pub shop: String,

    #[validate(range(exclusive_min = 0.0, message = "Cost must be positive"))]
    pub cost: f64,

    #[serde(default)]
    pub is_paid: bool,

    pub linked_job: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePartRequest {
    #[validate(length(min = 1, message = "Part name must not be empty"))]
    pub part_name: Option<String>,

    pub shop: Option<String>,

    #[validate(range(exclusive_min = 0.0, message = "Cost must be positive"))]
    pub cost: Option<f64>,

    pub is_paid: Option<bool>,
    pub linked_job: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    pub category: ExpenseCategory,

    #[validate(length(min = 1, message = "Expense name is required"))]
    pub expense_name: String,

    #[validate(range(exclusive_min = 0.0, message = "Amount must be positive"))]
    pub amount: f64,

    #[serde(default)]
    pub payment_method: PaymentMethod,

    pub paid_by: Option<String>,
    pub vendor_name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpenseRequest {
    pub category: Option<ExpenseCategory>,

    #[validate(length(min = 1, message = "Expense name must not be empty"))]
    pub expense_name: Option<String>,

    #[validate(range(exclusive_min = 0.0, message = "Amount must be positive"))]
    pub amount: Option<f64>,

    pub payment_method: Option<PaymentMethod>,
    pub paid_by: Option<String>,
    pub vendor_name: Option<String>,
    pub description: Option<String>,
}
