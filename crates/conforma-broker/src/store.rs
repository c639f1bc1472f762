use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use conforma_rules::ValidationReport;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("report store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stored reports at {path} are malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("serializing reports failed: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Where finished batches go. `store` replaces whatever was kept before.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn store(&self, reports: &[ValidationReport]) -> Result<(), StoreError>;
    async fn list(&self) -> Result<Vec<ValidationReport>, StoreError>;
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Keeps the latest batch as a pretty-printed JSON array on disk.
#[derive(Debug, Clone)]
pub struct FileReportStore {
    path: PathBuf,
}

impl FileReportStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl ReportStore for FileReportStore {
    async fn store(&self, reports: &[ValidationReport]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| self.io_error(source))?;
        }

        let body = serde_json::to_vec_pretty(reports).map_err(StoreError::Serialize)?;
        // Write-then-rename so readers never observe a half-written file.
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, body)
            .await
            .map_err(|source| self.io_error(source))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|source| self.io_error(source))?;

        tracing::info!(
            target: "conforma_broker",
            path = %self.path.display(),
            reports = reports.len(),
            "reports stored"
        );
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ValidationReport>, StoreError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(self.io_error(source)),
        };
        serde_json::from_slice(&raw).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::info!(
                    target: "conforma_broker",
                    path = %self.path.display(),
                    "stored reports cleared"
                );
                Ok(())
            }
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(self.io_error(source)),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryReportStore {
    reports: RwLock<Vec<ValidationReport>>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn store(&self, reports: &[ValidationReport]) -> Result<(), StoreError> {
        *self.reports.write().await = reports.to_vec();
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ValidationReport>, StoreError> {
        Ok(self.reports.read().await.clone())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.reports.write().await.clear();
        Ok(())
    }
}
