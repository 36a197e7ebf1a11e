use crate::domain::ids::{JobId, PaymentId};
use crate::domain::lifecycle::JobAction;
use crate::domain::job::JobStatus;
use crate::domain::payment::PaymentStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OddJobsError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    StorageError(#[from] rocksdb::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Job {job} cannot {action} while {from}")]
    InvalidTransition {
        job: JobId,
        from: JobStatus,
        action: JobAction,
    },
    #[error("Job {0} has no submitted work to review")]
    WorkNotSubmitted(JobId),
    #[error("Work for job {0} is already submitted")]
    WorkAlreadySubmitted(JobId),
    #[error("Payment {payment} is {status}, expected {expected}")]
    InvalidPaymentState {
        payment: PaymentId,
        status: PaymentStatus,
        expected: PaymentStatus,
    },
    #[error("Job {job} was modified concurrently (expected version {expected}, found {found})")]
    VersionConflict { job: JobId, expected: u64, found: u64 },
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} already exists")]
    DuplicateId(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, OddJobsError>;
