use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use conforma_broker::service::{self, validate_and_store};
use conforma_broker::{
    BatchDriver, BatchError, FixtureFactory, MemoryReportStore, PageInspector, ReportStore,
    StoreError,
};
use conforma_engines::fixture::{Fixture, FixturePage};
use conforma_network::{CapturedRequest, ResourceType};
use conforma_rules::{RuleSet, ValidationReport};

fn driver() -> BatchDriver {
    let mut fixture = Fixture::default();
    fixture.pages.insert(
        "https://site.com/index.shtm".to_string(),
        FixturePage {
            requests: vec![CapturedRequest::new(
                "https://site.com/index.shtm",
                ResourceType::Document,
            )],
            ..FixturePage::default()
        },
    );
    let factory = Arc::new(FixtureFactory::new(fixture));
    let inspector = PageInspector::new(RuleSet::default(), Arc::new(factory.fetcher()))
        .with_settle(Duration::from_millis(10));
    BatchDriver::new(factory, inspector)
}

#[tokio::test]
async fn service_validates_stores_lists_and_clears() -> Result<()> {
    let store = Arc::new(MemoryReportStore::new());
    let (handle, task) = service::spawn(driver(), store.clone());

    let reports = handle
        .validate(vec!["https://site.com/index.shtm".to_string()])
        .await?;
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(ValidationReport::overall_passed));

    assert_eq!(handle.list_reports().await?, reports);
    assert_eq!(store.list().await?, reports);

    handle.clear_reports().await?;
    assert!(handle.list_reports().await?.is_empty());

    handle.shutdown().await?;
    task.await?;
    assert!(matches!(
        handle.list_reports().await,
        Err(BatchError::ServiceUnavailable)
    ));
    Ok(())
}

#[tokio::test]
async fn invalid_urls_leave_the_store_untouched() -> Result<()> {
    let store = Arc::new(MemoryReportStore::new());
    let (handle, _task) = service::spawn(driver(), store.clone());

    handle
        .validate(vec!["https://site.com/index.shtm".to_string()])
        .await?;
    let result = handle.validate(vec!["::nope::".to_string()]).await;

    assert!(matches!(result, Err(BatchError::InvalidInput(_))));
    assert_eq!(store.list().await?.len(), 2);
    Ok(())
}

struct ReadOnlyStore;

#[async_trait]
impl ReportStore for ReadOnlyStore {
    async fn store(&self, _reports: &[ValidationReport]) -> Result<(), StoreError> {
        Err(StoreError::Io {
            path: "results.json".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }

    async fn list(&self) -> Result<Vec<ValidationReport>, StoreError> {
        Ok(Vec::new())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[tokio::test]
async fn store_failure_returns_computed_reports() {
    let result = validate_and_store(&driver(), &ReadOnlyStore, &["https://site.com/index.shtm"]).await;

    match result {
        Err(BatchError::NotPersisted { reports, source }) => {
            assert_eq!(reports.len(), 2);
            assert!(source.to_string().contains("read-only"));
        }
        other => panic!("expected NotPersisted, got {other:?}"),
    }
}
