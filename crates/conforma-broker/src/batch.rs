use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use conforma_engines::{BrowserEngine, ViewportSpec};
use conforma_rules::ValidationReport;
use futures::FutureExt;
use url::Url;

use crate::engine_factory::EngineFactory;
use crate::error::BatchError;
use crate::inspector::PageInspector;

/// A submitted page address, kept verbatim next to its parsed form.
///
/// Labels and the HTML extension rule use the text exactly as submitted;
/// origin comparisons use the parsed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTarget {
    raw: String,
    url: Url,
}

impl PageTarget {
    pub fn parse(raw: &str) -> Result<Self, BatchError> {
        let trimmed = raw.trim();
        let url = Url::parse(trimmed)
            .map_err(|error| BatchError::InvalidInput(format!("`{raw}` is not a valid URL: {error}")))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(BatchError::InvalidInput(format!(
                "`{raw}` must be an absolute http(s) URL"
            )));
        }
        Ok(Self {
            raw: trimmed.to_string(),
            url,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl std::fmt::Display for PageTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

pub fn parse_urls<S: AsRef<str>>(urls: &[S]) -> Result<Vec<PageTarget>, BatchError> {
    urls.iter().map(|url| PageTarget::parse(url.as_ref())).collect()
}

/// Validates an untyped URL list, as received over HTTP, before any
/// browser work starts.
pub fn parse_url_list(value: &serde_json::Value) -> Result<Vec<PageTarget>, BatchError> {
    let items = value
        .as_array()
        .ok_or_else(|| BatchError::InvalidInput("expected an array of URLs".to_string()))?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let raw = item.as_str().ok_or_else(|| {
                BatchError::InvalidInput(format!("entry {index} is not a string"))
            })?;
            PageTarget::parse(raw)
        })
        .collect()
}

/// Runs every (URL, viewport) trial of a batch against one browser.
pub struct BatchDriver {
    factory: Arc<dyn EngineFactory>,
    inspector: PageInspector,
    viewports: Vec<ViewportSpec>,
}

impl BatchDriver {
    pub fn new(factory: Arc<dyn EngineFactory>, inspector: PageInspector) -> Self {
        Self {
            factory,
            inspector,
            viewports: ViewportSpec::standard_pair(),
        }
    }

    pub fn with_viewports(mut self, viewports: Vec<ViewportSpec>) -> Self {
        self.viewports = viewports;
        self
    }

    pub fn viewports(&self) -> &[ViewportSpec] {
        &self.viewports
    }

    pub async fn run<S: AsRef<str>>(&self, urls: &[S]) -> Result<Vec<ValidationReport>, BatchError> {
        let targets = parse_urls(urls)?;
        self.run_targets(&targets).await
    }

    /// Reports come back URL-major, viewport-minor. The browser is closed
    /// exactly once whichever way the batch ends.
    pub async fn run_targets(&self, targets: &[PageTarget]) -> Result<Vec<ValidationReport>, BatchError> {
        if targets.is_empty() {
            return Ok(Vec::new());
        }

        let engine = self
            .factory
            .launch()
            .await
            .map_err(|error| BatchError::browser("launching browser", &error))?;
        tracing::info!(
            target: "conforma_broker",
            engine = %engine.kind(),
            urls = targets.len(),
            viewports = self.viewports.len(),
            "batch started"
        );

        let outcome = AssertUnwindSafe(self.run_trials(engine.as_ref(), targets))
            .catch_unwind()
            .await;

        if let Err(error) = engine.close().await {
            tracing::warn!(
                target: "conforma_broker",
                error = %error,
                "closing browser after batch failed"
            );
        }

        match outcome {
            Ok(result) => {
                if let Ok(reports) = &result {
                    let failed = reports.iter().filter(|report| !report.overall_passed()).count();
                    tracing::info!(
                        target: "conforma_broker",
                        reports = reports.len(),
                        failed,
                        "batch finished"
                    );
                }
                result
            }
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    async fn run_trials(
        &self,
        engine: &dyn BrowserEngine,
        targets: &[PageTarget],
    ) -> Result<Vec<ValidationReport>, BatchError> {
        let mut reports = Vec::with_capacity(targets.len() * self.viewports.len());
        for target in targets {
            for viewport in &self.viewports {
                let page = engine.new_page().await.map_err(|error| {
                    BatchError::browser(&format!("opening page for {target}"), &error)
                })?;
                reports.push(self.inspector.inspect(page, target, viewport).await);
            }
        }
        Ok(reports)
    }
}
