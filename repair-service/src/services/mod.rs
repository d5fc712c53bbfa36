pub mod dashboard;
pub mod error;
pub mod jobs;
pub mod ledger;
pub mod metrics;
pub mod reconciliation;
pub mod retry;
pub mod store;

pub use error::RepairError;
pub use jobs::JobService;
pub use ledger::{NewPayment, PaymentAmendment, PaymentLedger};
pub use metrics::{get_metrics, init_metrics};
pub use retry::RetryPolicy;
pub use store::{
    Filter, MemoryStore, MongoStore, RecordStore, Sort, StoreError, TenantStore, TenantUnitOfWork,
    UnitOfWork,
};
