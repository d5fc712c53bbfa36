//! Payment ledger.
//!
//! A payment and the job totals it moves are written in one unit of work.
//! The job row is replaced with a `version` predicate, so two writers that
//! read the same job cannot both commit; the loser replays from a fresh
//! read under [`RetryPolicy`].

use chrono::{NaiveDate, Utc};

use super::error::RepairError;
use super::metrics::{PAYMENTS_AMENDED_TOTAL, PAYMENTS_RECORDED_TOTAL, ROLLBACKS_TOTAL};
use super::reconciliation;
use super::retry::RetryPolicy;
use super::store::{Filter, Sort, TenantStore, TenantUnitOfWork};
use crate::dtos::PaymentSummary;
use crate::models::{new_id, Customer, Job, Payment};

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub job: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub profit: f64,
}

/// Fields of a payment that may be amended. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct PaymentAmendment {
    pub amount: Option<f64>,
    pub date: Option<NaiveDate>,
    pub profit: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentLedger {
    retry: RetryPolicy,
}

fn validate_amount(amount: f64) -> Result<(), RepairError> {
    reconciliation::require_positive("amount", amount)
        .and_then(|()| reconciliation::require_cents("amount", amount))
        .map_err(RepairError::Validation)
}

fn validate_profit(profit: f64) -> Result<(), RepairError> {
    if !profit.is_finite() {
        return Err(RepairError::Validation("profit must be a number".to_string()));
    }
    Ok(())
}

/// Apply `delta` to the job's received total and bump its version.
fn settle_job(job: &Job, delta: f64) -> Job {
    let mut next = job.clone();
    next.payment_status = reconciliation::apply_received_delta(&mut next.financials, delta);
    next.version = job.version + 1;
    next.updated_at = Utc::now();
    next
}

async fn replace_job(uow: &mut TenantUnitOfWork, previous: &Job, next: &Job) -> Result<(), RepairError> {
    let guard = Filter::new().eq("version", previous.version);
    if !uow.replace(guard, next).await? {
        return Err(RepairError::Conflict(format!("job {}", previous.id)));
    }
    Ok(())
}

/// Commit on success, abort otherwise. Abort failures are logged only.
async fn finish<T>(
    uow: TenantUnitOfWork,
    operation: &'static str,
    result: Result<T, RepairError>,
) -> Result<T, RepairError> {
    match result {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(e) => {
            ROLLBACKS_TOTAL.with_label_values(&[operation]).inc();
            if let Err(abort_err) = uow.abort().await {
                tracing::warn!(operation, error = %abort_err, "Failed to abort unit of work");
            }
            Err(e)
        }
    }
}

impl PaymentLedger {
    pub fn new(retry: RetryPolicy) -> Self {
        Self { retry }
    }

    /// Record a payment and fold it into the job's totals.
    pub async fn record(&self, store: &TenantStore, input: NewPayment) -> Result<(Payment, Job), RepairError> {
        validate_amount(input.amount)?;
        validate_profit(input.profit)?;

        let now = Utc::now();
        let payment = Payment {
            id: new_id(),
            job: input.job,
            amount: input.amount,
            date: input.date,
            profit: input.profit,
            organization: store.org_id().to_string(),
            version: 0,
            created_at: now,
            updated_at: now,
        };

        let payment_ref = &payment;
        let result = self
            .retry
            .run("record_payment", || async move { Self::try_record(store, payment_ref).await })
            .await;

        match result {
            Ok(job) => {
                PAYMENTS_RECORDED_TOTAL.with_label_values(&["ok"]).inc();
                tracing::info!(
                    payment_id = %payment.id,
                    job_id = %job.id,
                    org_id = %store.org_id(),
                    amount = payment.amount,
                    balance = job.financials.balance_amount,
                    "Payment recorded"
                );
                Ok((payment, job))
            }
            Err(e) => {
                PAYMENTS_RECORDED_TOTAL.with_label_values(&["rejected"]).inc();
                Err(e)
            }
        }
    }

    async fn try_record(store: &TenantStore, payment: &Payment) -> Result<Job, RepairError> {
        let mut uow = store.begin().await?;
        let result: Result<Job, RepairError> = async {
            let job: Job = uow
                .find_by_id(&payment.job)
                .await?
                .ok_or(RepairError::NotFound("Job"))?;
            uow.insert(payment).await?;
            let next = settle_job(&job, payment.amount);
            replace_job(&mut uow, &job, &next).await?;
            Ok(next)
        }
        .await;
        finish(uow, "record_payment", result).await
    }

    /// Amend a payment. The old amount is taken back out of the job and the
    /// new one applied in the same unit of work as the payment edit.
    pub async fn amend(
        &self,
        store: &TenantStore,
        payment_id: &str,
        amendment: PaymentAmendment,
    ) -> Result<(Payment, Job), RepairError> {
        if let Some(amount) = amendment.amount {
            validate_amount(amount)?;
        }
        if let Some(profit) = amendment.profit {
            validate_profit(profit)?;
        }

        let amendment_ref = &amendment;
        let result = self
            .retry
            .run("amend_payment", || async move {
                Self::try_amend(store, payment_id, amendment_ref).await
            })
            .await;

        match result {
            Ok((payment, job)) => {
                PAYMENTS_AMENDED_TOTAL.with_label_values(&["ok"]).inc();
                tracing::info!(
                    payment_id = %payment.id,
                    job_id = %job.id,
                    org_id = %store.org_id(),
                    amount = payment.amount,
                    balance = job.financials.balance_amount,
                    "Payment amended"
                );
                Ok((payment, job))
            }
            Err(e) => {
                PAYMENTS_AMENDED_TOTAL.with_label_values(&["rejected"]).inc();
                Err(e)
            }
        }
    }

    async fn try_amend(
        store: &TenantStore,
        payment_id: &str,
        amendment: &PaymentAmendment,
    ) -> Result<(Payment, Job), RepairError> {
        let mut uow = store.begin().await?;
        let result: Result<(Payment, Job), RepairError> = async {
            let current: Payment = uow
                .find_by_id(payment_id)
                .await?
                .ok_or(RepairError::NotFound("Payment"))?;
            let job: Job = uow
                .find_by_id(&current.job)
                .await?
                .ok_or(RepairError::NotFound("Job"))?;

            let mut next = current.clone();
            if let Some(amount) = amendment.amount {
                next.amount = amount;
            }
            if let Some(date) = amendment.date {
                next.date = date;
            }
            if let Some(profit) = amendment.profit {
                next.profit = profit;
            }
            next.version = current.version + 1;
            next.updated_at = Utc::now();

            let guard = Filter::new().eq("version", current.version);
            if !uow.replace(guard, &next).await? {
                return Err(RepairError::Conflict(format!("payment {}", current.id)));
            }

            let delta = reconciliation::to_f64(
                reconciliation::to_decimal(next.amount) - reconciliation::to_decimal(current.amount),
            );
            let next_job = settle_job(&job, delta);
            replace_job(&mut uow, &job, &next_job).await?;
            Ok((next, next_job))
        }
        .await;
        finish(uow, "amend_payment", result).await
    }

    /// Payments of the caller's organization by payment date, latest first.
    pub async fn list(&self, store: &TenantStore, job: Option<&str>) -> Result<Vec<Payment>, RepairError> {
        let filter = match job {
            Some(job) => Filter::new().eq("job", job),
            None => Filter::new(),
        };
        Ok(store.find(filter, Some(Sort::desc("date"))).await?)
    }

    /// Attach the job code and customer name to listed payments.
    pub async fn summarize(
        &self,
        store: &TenantStore,
        payments: Vec<Payment>,
    ) -> Result<Vec<PaymentSummary>, RepairError> {
        let jobs = store
            .find_by_ids::<Job>(payments.iter().map(|payment| payment.job.as_str()).collect::<Vec<&str>>())
            .await?;
        let customers = store
            .find_by_ids::<Customer>(jobs.values().map(|job| job.customer.as_str()).collect::<Vec<&str>>())
            .await?;

        Ok(payments
            .into_iter()
            .map(|payment| {
                let job = jobs.get(&payment.job);
                PaymentSummary {
                    job_code: job.map(|job| job.job_id.clone()),
                    customer_name: job
                        .and_then(|job| customers.get(&job.customer))
                        .map(|customer| customer.name.clone()),
                    payment,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Device, Financials, JobStatus, PaymentStatus, RepairDetails};
    use crate::services::store::{MemoryStore, RecordStore};
    use std::sync::Arc;

    fn store() -> TenantStore {
        let backend: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        TenantStore::new(backend, "org-1")
    }

    async fn seed_job(store: &TenantStore, charges: f64, spare: f64) -> Job {
        let now = Utc::now();
        let mut financials = Financials {
            repairing_charges: charges,
            total_spare_cost: spare,
            ..Financials::default()
        };
        let payment_status = reconciliation::recompute(&mut financials);
        let job = Job {
            id: new_id(),
            job_id: "JOB-000001".to_string(),
            customer: "c1".to_string(),
            device: Device {
                model: "iPhone 12".to_string(),
                problem: "Battery drain".to_string(),
                imei: None,
                image: None,
            },
            repair_details: RepairDetails::default(),
            financials,
            status: JobStatus::Received,
            payment_status,
            organization: "org-1".to_string(),
            version: 0,
            created_at: now,
            updated_at: now,
        };
        store.insert(&job).await.unwrap();
        job
    }

    fn payment(job: &Job, amount: f64) -> NewPayment {
        NewPayment {
            job: job.id.clone(),
            amount,
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            profit: 0.0,
        }
    }

    #[tokio::test]
    async fn payments_settle_the_job() {
        let store = store();
        let ledger = PaymentLedger::default();
        let job = seed_job(&store, 1000.0, 200.0).await;

        let (_, after_first) = ledger.record(&store, payment(&job, 500.0)).await.unwrap();
        assert_eq!(after_first.financials.total_received, 500.0);
        assert_eq!(after_first.financials.balance_amount, 700.0);
        assert_eq!(after_first.payment_status, PaymentStatus::PartiallyPaid);

        let (_, after_second) = ledger.record(&store, payment(&job, 700.0)).await.unwrap();
        assert_eq!(after_second.financials.total_received, 1200.0);
        assert_eq!(after_second.financials.balance_amount, 0.0);
        assert_eq!(after_second.payment_status, PaymentStatus::Paid);
        assert_eq!(after_second.version, 2);
    }

    #[tokio::test]
    async fn summaries_carry_job_code_and_customer_name() {
        let store = store();
        let ledger = PaymentLedger::default();
        let now = Utc::now();
        store
            .insert(&Customer {
                id: "c1".to_string(),
                name: "Ravi Kumar".to_string(),
                contact: "9876543210".to_string(),
                address: None,
                is_shopkeeper: false,
                organization: "org-1".to_string(),
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        let job = seed_job(&store, 1000.0, 0.0).await;
        ledger.record(&store, payment(&job, 100.0)).await.unwrap();
        ledger.record(&store, payment(&job, 250.0)).await.unwrap();

        let payments = ledger.list(&store, Some(&job.id)).await.unwrap();
        let summaries = ledger.summarize(&store, payments).await.unwrap();
        assert_eq!(summaries.len(), 2);
        for summary in &summaries {
            assert_eq!(summary.job_code.as_deref(), Some("JOB-000001"));
            assert_eq!(summary.customer_name.as_deref(), Some("Ravi Kumar"));
        }
    }

    #[tokio::test]
    async fn amendment_applies_the_difference() {
        let store = store();
        let ledger = PaymentLedger::default();
        let job = seed_job(&store, 1000.0, 200.0).await;

        let (first, _) = ledger.record(&store, payment(&job, 500.0)).await.unwrap();
        ledger.record(&store, payment(&job, 700.0)).await.unwrap();

        let (amended, job) = ledger
            .amend(
                &store,
                &first.id,
                PaymentAmendment {
                    amount: Some(300.0),
                    ..PaymentAmendment::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(amended.amount, 300.0);
        assert_eq!(amended.version, 1);
        assert_eq!(job.financials.total_received, 1000.0);
        assert_eq!(job.financials.balance_amount, 200.0);
        assert_eq!(job.payment_status, PaymentStatus::PartiallyPaid);
    }

    #[tokio::test]
    async fn missing_job_rejects_without_writing() {
        let store = store();
        let ledger = PaymentLedger::default();
        let ghost = NewPayment {
            job: "no-such-job".to_string(),
            amount: 100.0,
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            profit: 0.0,
        };

        let err = ledger.record(&store, ghost).await.unwrap_err();
        assert!(matches!(err, RepairError::NotFound("Job")));
        assert!(ledger.list(&store, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_positive_amounts_are_rejected() {
        let store = store();
        let ledger = PaymentLedger::default();
        let job = seed_job(&store, 100.0, 0.0).await;

        for amount in [0.0, -10.0, f64::NAN] {
            let err = ledger.record(&store, payment(&job, amount)).await.unwrap_err();
            assert!(matches!(err, RepairError::Validation(_)));
        }
        let stored: Job = store.find_by_id(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.financials.total_received, 0.0);
    }

    #[tokio::test]
    async fn sub_cent_amounts_are_rejected() {
        let store = store();
        let ledger = PaymentLedger::default();
        let job = seed_job(&store, 100.0, 0.0).await;

        let err = ledger.record(&store, payment(&job, 0.004)).await.unwrap_err();
        assert!(matches!(err, RepairError::Validation(_)));

        let (paid, _) = ledger.record(&store, payment(&job, 40.25)).await.unwrap();
        let err = ledger
            .amend(
                &store,
                &paid.id,
                PaymentAmendment {
                    amount: Some(40.255),
                    ..PaymentAmendment::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepairError::Validation(_)));

        let stored: Job = store.find_by_id(&job.id).await.unwrap().unwrap();
        let payments = ledger.list(&store, Some(&job.id)).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount, 40.25);
        assert_eq!(stored.financials.total_received, 40.25);
        assert_eq!(stored.financials.balance_amount, 59.75);
    }

    #[tokio::test]
    async fn concurrent_payments_are_both_counted() {
        let store = store();
        let ledger = PaymentLedger::default();
        let job = seed_job(&store, 1000.0, 0.0).await;

        let (a, b) = tokio::join!(
            ledger.record(&store, payment(&job, 100.0)),
            ledger.record(&store, payment(&job, 100.0)),
        );
        a.unwrap();
        b.unwrap();

        let stored: Job = store.find_by_id(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.financials.total_received, 200.0);
        assert_eq!(stored.financials.balance_amount, 800.0);
        assert_eq!(ledger.list(&store, Some(&job.id)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn racing_amendments_and_payments_keep_totals_in_step() {
        let store = store();
        let ledger = PaymentLedger::default();
        let job = seed_job(&store, 1000.0, 0.0).await;
        let (first, _) = ledger.record(&store, payment(&job, 200.0)).await.unwrap();

        let amend_to = |amount: f64| PaymentAmendment {
            amount: Some(amount),
            ..PaymentAmendment::default()
        };
        let (a, b, c) = tokio::join!(
            ledger.amend(&store, &first.id, amend_to(300.0)),
            ledger.amend(&store, &first.id, amend_to(400.0)),
            ledger.record(&store, payment(&job, 150.0)),
        );
        a.unwrap();
        b.unwrap();
        c.unwrap();

        let payments = ledger.list(&store, Some(&job.id)).await.unwrap();
        let sum: f64 = payments.iter().map(|p| p.amount).sum();
        let amended = payments.iter().find(|p| p.id == first.id).unwrap();
        assert!(amended.amount == 300.0 || amended.amount == 400.0);
        assert_eq!(amended.version, 2);

        let stored: Job = store.find_by_id(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.financials.total_received, sum);
        assert_eq!(stored.financials.balance_amount, 1000.0 - sum);
        assert_eq!(stored.version, 4);
    }
}
