use std::sync::Arc;

use conforma_rules::ValidationReport;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::batch::BatchDriver;
use crate::error::BatchError;
use crate::handle::{ValidationHandle, ValidationRequest};
use crate::store::ReportStore;

/// Starts the service loop on the current runtime.
pub fn spawn(driver: BatchDriver, store: Arc<dyn ReportStore>) -> (ValidationHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(rx, driver, store));
    (ValidationHandle::new(tx), task)
}

/// Single worker: requests are served one at a time, so batches never
/// overlap and the store is never written concurrently.
pub async fn run(
    mut rx: mpsc::UnboundedReceiver<ValidationRequest>,
    driver: BatchDriver,
    store: Arc<dyn ReportStore>,
) {
    tracing::info!(target: "conforma_broker", "service loop started");

    while let Some(req) = rx.recv().await {
        match req {
            ValidationRequest::Validate { urls, reply } => {
                tracing::info!(target: "conforma_broker", urls = urls.len(), "Validate");
                let result = validate_and_store(&driver, store.as_ref(), &urls).await;
                let _ = reply.send(result);
            }
            ValidationRequest::ListReports { reply } => {
                tracing::info!(target: "conforma_broker", "ListReports");
                let result = store.list().await.map_err(BatchError::from);
                let _ = reply.send(result);
            }
            ValidationRequest::ClearReports { reply } => {
                tracing::info!(target: "conforma_broker", "ClearReports");
                let result = store.clear().await.map_err(BatchError::from);
                let _ = reply.send(result);
            }
            ValidationRequest::Shutdown { reply } => {
                tracing::info!(target: "conforma_broker", "Shutdown - exiting service loop");
                let _ = reply.send(Ok(()));
                break;
            }
        }
    }

    tracing::info!(target: "conforma_broker", "service loop exited");
}

/// Runs a batch and persists it. A store failure hands the computed
/// reports back inside the error rather than discarding them.
pub async fn validate_and_store<S: AsRef<str>>(
    driver: &BatchDriver,
    store: &dyn ReportStore,
    urls: &[S],
) -> Result<Vec<ValidationReport>, BatchError> {
    let reports = driver.run(urls).await?;
    match store.store(&reports).await {
        Ok(()) => Ok(reports),
        Err(source) => {
            tracing::error!(
                target: "conforma_broker",
                error = %source,
                "storing reports failed"
            );
            Err(BatchError::NotPersisted { source, reports })
        }
    }
}
