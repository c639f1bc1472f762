use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use conforma_engines::chromium::{ChromiumEngine, ChromiumOptions};
use conforma_engines::fixture::{Fixture, FixtureEngine, FixtureFetcher};
use conforma_engines::BrowserEngine;

/// Launches the browser a batch runs against. One launch per batch.
#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserEngine>>;
}

/// Production factory.
///
/// Executable resolution order:
/// 1. `executable` from the options.
/// 2. `CONFORMA_CHROME` environment variable.
/// 3. chromiumoxide's own Chrome/Chromium detection.
#[derive(Debug, Clone, Default)]
pub struct ChromiumFactory {
    options: ChromiumOptions,
}

impl ChromiumFactory {
    pub fn new(options: ChromiumOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl EngineFactory for ChromiumFactory {
    async fn launch(&self) -> Result<Box<dyn BrowserEngine>> {
        let mut options = self.options.clone();
        if options.executable.is_none() {
            if let Ok(executable) = std::env::var("CONFORMA_CHROME") {
                let trimmed = executable.trim().to_string();
                if !trimmed.is_empty() {
                    tracing::info!(
                        target: "conforma_broker",
                        executable = %trimmed,
                        "engine factory: using CONFORMA_CHROME"
                    );
                    options.executable = Some(trimmed);
                }
            }
        }

        let engine = ChromiumEngine::launch(options).await?;
        Ok(Box::new(engine))
    }
}

/// Replays one fixture; every launch gets a fresh engine over it.
#[derive(Debug, Default)]
pub struct FixtureFactory {
    fixture: Arc<Fixture>,
    launched: Mutex<Vec<FixtureEngine>>,
}

impl FixtureFactory {
    pub fn new(fixture: Fixture) -> Self {
        Self::from_shared(Arc::new(fixture))
    }

    pub fn from_shared(fixture: Arc<Fixture>) -> Self {
        Self {
            fixture,
            launched: Mutex::default(),
        }
    }

    pub fn fetcher(&self) -> FixtureFetcher {
        FixtureFetcher::from_shared(Arc::clone(&self.fixture))
    }

    /// Engines handed out so far, oldest first.
    pub fn launched(&self) -> Vec<FixtureEngine> {
        self.launched
            .lock()
            .map(|engines| engines.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EngineFactory for FixtureFactory {
    async fn launch(&self) -> Result<Box<dyn BrowserEngine>> {
        tracing::info!(target: "conforma_broker", "engine factory: replaying fixture");
        let engine = FixtureEngine::from_shared(Arc::clone(&self.fixture));
        if let Ok(mut launched) = self.launched.lock() {
            launched.push(engine.clone());
        }
        Ok(Box::new(engine))
    }
}
