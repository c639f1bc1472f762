use conforma_rules::ValidationReport;
use tokio::sync::{mpsc, oneshot};

use crate::error::BatchError;

type Reply<T> = oneshot::Sender<Result<T, BatchError>>;

#[derive(Debug)]
pub enum ValidationRequest {
    Validate {
        urls: Vec<String>,
        reply: Reply<Vec<ValidationReport>>,
    },
    ListReports {
        reply: Reply<Vec<ValidationReport>>,
    },
    ClearReports {
        reply: Reply<()>,
    },
    Shutdown {
        reply: Reply<()>,
    },
}

/// Cloneable front door to the validation service loop.
#[derive(Clone, Debug)]
pub struct ValidationHandle {
    tx: mpsc::UnboundedSender<ValidationRequest>,
}

impl ValidationHandle {
    pub fn new(tx: mpsc::UnboundedSender<ValidationRequest>) -> Self {
        Self { tx }
    }

    async fn round_trip<T, F>(&self, build_request: F) -> Result<T, BatchError>
    where
        F: FnOnce(Reply<T>) -> ValidationRequest,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build_request(reply_tx))
            .map_err(|_| BatchError::ServiceUnavailable)?;
        reply_rx.await.map_err(|_| BatchError::ServiceUnavailable)?
    }

    pub async fn validate(&self, urls: Vec<String>) -> Result<Vec<ValidationReport>, BatchError> {
        self.round_trip(|reply| ValidationRequest::Validate { urls, reply })
            .await
    }

    pub async fn list_reports(&self) -> Result<Vec<ValidationReport>, BatchError> {
        self.round_trip(|reply| ValidationRequest::ListReports { reply })
            .await
    }

    pub async fn clear_reports(&self) -> Result<(), BatchError> {
        self.round_trip(|reply| ValidationRequest::ClearReports { reply })
            .await
    }

    pub async fn shutdown(&self) -> Result<(), BatchError> {
        self.round_trip(|reply| ValidationRequest::Shutdown { reply })
            .await
    }
}
