use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use conforma_broker::{
    BatchDriver, ChromiumFactory, EngineFactory, FileReportStore, FixtureFactory, PageInspector,
    ReportStore,
};
use conforma_engines::chromium::ChromiumOptions;
use conforma_engines::fixture::Fixture;
use conforma_engines::EngineKind;
use conforma_network::{HttpFetcher, ResourceFetcher};
use conforma_rules::RuleSet;

use crate::config::Config;

/// Wires engine, fetcher and rules from configuration.
pub fn build_driver(config: &Config) -> Result<BatchDriver> {
    config.validate()?;

    let (factory, fetcher): (Arc<dyn EngineFactory>, Arc<dyn ResourceFetcher>) =
        match config.browser.engine {
            EngineKind::Chromium => {
                let options = ChromiumOptions {
                    headless: config.browser.headless,
                    executable: config.browser.executable.clone(),
                    no_sandbox: config.browser.no_sandbox,
                    extra_args: config.browser.extra_args.clone(),
                    request_timeout: config.browser.navigation_timeout(),
                };
                let fetcher = HttpFetcher::new(
                    Duration::from_secs(config.fetch.timeout_secs),
                    &config.fetch.user_agent,
                )?;
                (Arc::new(ChromiumFactory::new(options)), Arc::new(fetcher))
            }
            EngineKind::Fixture => {
                let path = config
                    .browser
                    .fixture
                    .as_deref()
                    .context("browser.fixture is not set")?;
                let factory = FixtureFactory::new(Fixture::load(path)?);
                let fetcher = factory.fetcher();
                (Arc::new(factory), Arc::new(fetcher))
            }
        };

    tracing::debug!(
        engine = %config.browser.engine,
        navigation_timeout_secs = config.browser.navigation_timeout_secs,
        "batch driver configured"
    );

    let inspector = PageInspector::new(RuleSet::new(config.rules.clone()), fetcher)
        .with_navigation_timeout(config.browser.navigation_timeout())
        .with_settle(config.browser.settle())
        .with_max_settle(config.browser.max_settle());
    Ok(BatchDriver::new(factory, inspector))
}

pub fn build_store(config: &Config) -> Arc<dyn ReportStore> {
    Arc::new(FileReportStore::new(config.store.results_path.clone()))
}
