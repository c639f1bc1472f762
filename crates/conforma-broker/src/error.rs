use conforma_rules::ValidationReport;

use crate::store::StoreError;

/// Failures that end a batch or a store operation.
///
/// Anything that goes wrong inside a single trial is folded into that
/// trial's report instead and never shows up here.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("invalid URL list: {0}")]
    InvalidInput(String),

    #[error("browser failure: {0}")]
    Browser(String),

    #[error("report store failure: {0}")]
    Store(#[from] StoreError),

    #[error("reports were computed but could not be stored: {source}")]
    NotPersisted {
        #[source]
        source: StoreError,
        reports: Vec<ValidationReport>,
    },

    #[error("validation service is not running")]
    ServiceUnavailable,
}

impl BatchError {
    pub fn browser(context: &str, error: &anyhow::Error) -> Self {
        BatchError::Browser(format!("{context}: {error:#}"))
    }
}
