use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompmapError {
    #[error("process not found: {0}")]
    ProcessNotFound(i64),

    #[error("subprocess not found: {0}")]
    SubprocessNotFound(i64),

    #[error("unit not found: {0}")]
    UnitNotFound(i64),

    #[error("unit {unit} cannot {action} while in situation '{situation}'")]
    InvalidTransition {
        unit: i64,
        situation: String,
        action: String,
    },

    #[error("role '{role}' is not allowed to {action}")]
    RoleNotAllowed { role: String, action: String },

    #[error("units no longer eligible for the requested action: {units:?}")]
    StaleEligibility { units: Vec<i64> },

    #[error("bulk action partially failed: {} succeeded, {} failed ({failed:?})", .succeeded.len(), .failed.len())]
    PartialBulkFailure {
        succeeded: Vec<i64>,
        failed: Vec<(i64, String)>,
    },

    #[error("cannot finalize process {process}: units pending homologation: {units:?}")]
    FinalizationBlocked { process: i64, units: Vec<i64> },

    #[error("{0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, CompmapError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
