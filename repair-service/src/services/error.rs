use repair_core::error::AppError;
use thiserror::Error;

use super::store::StoreError;

/// Seconds a client should wait before resubmitting a rolled-back request.
const RETRY_AFTER_SECS: u64 = 1;

#[derive(Error, Debug)]
pub enum RepairError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// A versioned write kept losing races until the retry budget ran out.
    #[error("Concurrent update conflict on {0}")]
    Conflict(String),

    /// A unit of work failed part way and was rolled back.
    #[error("Operation rolled back: {0}")]
    Consistency(#[source] StoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RepairError {
    /// Whether an internal retry may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            RepairError::Conflict(_) => true,
            RepairError::Store(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl From<RepairError> for AppError {
    fn from(err: RepairError) -> Self {
        match err {
            RepairError::Validation(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            RepairError::NotFound(what) => AppError::NotFound(anyhow::anyhow!("{} not found", what)),
            RepairError::Conflict(what) => AppError::Conflict(anyhow::anyhow!(
                "Concurrent update conflict on {}, please retry",
                what
            )),
            RepairError::Consistency(e) => AppError::Retryable(
                anyhow::anyhow!("Operation rolled back: {}", e),
                Some(RETRY_AFTER_SECS),
            ),
            RepairError::Store(StoreError::WriteConflict(what)) => AppError::Conflict(anyhow::anyhow!(
                "Concurrent update conflict on {}, please retry",
                what
            )),
            RepairError::Store(StoreError::DuplicateKey(key)) => {
                AppError::Conflict(anyhow::anyhow!("Duplicate key {}", key))
            }
            RepairError::Store(e) if e.is_retryable() => {
                AppError::Retryable(anyhow::Error::new(e), Some(RETRY_AFTER_SECS))
            }
            RepairError::Store(e) => AppError::DatabaseError(anyhow::Error::new(e)),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::from(RepairError::Store(err))
    }
}
