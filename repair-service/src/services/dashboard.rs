use rust_decimal::Decimal;

use super::error::RepairError;
use super::reconciliation::{to_decimal, to_f64};
use super::store::{Filter, TenantStore};
use crate::dtos::{DashboardFinancials, DashboardResponse};
use crate::models::{Expense, Job, Payment};

/// Fold the organization's jobs, payments and expenses into one overview.
pub async fn summarize(store: &TenantStore) -> Result<DashboardResponse, RepairError> {
    let jobs: Vec<Job> = store.find(Filter::new(), None).await?;
    let payments: Vec<Payment> = store.find(Filter::new(), None).await?;
    let expenses: Vec<Expense> = store.find(Filter::new(), None).await?;

    let mut response = DashboardResponse::default();
    for job in &jobs {
        *response
            .status_counts
            .entry(job.status.as_str().to_string())
            .or_default() += 1;
        *response
            .payment_status_counts
            .entry(job.payment_status.as_str().to_string())
            .or_default() += 1;
    }

    let received: Decimal = payments.iter().map(|p| to_decimal(p.amount)).sum();
    let profit: Decimal = payments.iter().map(|p| to_decimal(p.profit)).sum();
    let spent: Decimal = expenses.iter().map(|e| to_decimal(e.amount)).sum();

    response.financials = DashboardFinancials {
        total_received: to_f64(received),
        total_profit: to_f64(profit),
        total_expenses: to_f64(spent),
        net_profit: to_f64(profit - spent),
    };

    tracing::debug!(
        org_id = %store.org_id(),
        jobs = jobs.len(),
        payments = payments.len(),
        expenses = expenses.len(),
        "Dashboard summarized"
    );
    Ok(response)
}
