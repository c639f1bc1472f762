use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use conforma_network::{CapturedRequest, FetchedResource, ResourceFetcher};
use futures::channel::mpsc;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::{BrowserEngine, EngineKind, PageSession, RequestEventStream, ViewportSpec};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    #[serde(default)]
    pub pages: BTreeMap<String, FixturePage>,
    #[serde(default)]
    pub resources: BTreeMap<String, FixtureResource>,
    /// Simulates a browser crash: opening more pages than this fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crash_after_pages: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixturePage {
    #[serde(default)]
    pub requests: Vec<CapturedRequest>,
    /// Navigation fails with this message after the requests were emitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation_error: Option<String>,
    /// Navigation never completes after the requests were emitted.
    #[serde(default)]
    pub hang: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureResource {
    pub size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl Fixture {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixture: {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing fixture: {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[derive(Debug, Default)]
struct EngineState {
    pages_opened: AtomicUsize,
    pages_closed: AtomicUsize,
    close_calls: AtomicUsize,
    closed: AtomicBool,
}

/// Cloning shares the underlying state, so a caller can keep a handle to
/// inspect page and close counters after the engine was handed off.
#[derive(Debug, Clone)]
pub struct FixtureEngine {
    fixture: Arc<Fixture>,
    state: Arc<EngineState>,
}

impl FixtureEngine {
    pub fn new(fixture: Fixture) -> Self {
        Self::from_shared(Arc::new(fixture))
    }

    pub fn from_shared(fixture: Arc<Fixture>) -> Self {
        Self {
            fixture,
            state: Arc::default(),
        }
    }

    pub fn fetcher(&self) -> FixtureFetcher {
        FixtureFetcher {
            fixture: Arc::clone(&self.fixture),
        }
    }

    pub fn pages_opened(&self) -> usize {
        self.state.pages_opened.load(Ordering::SeqCst)
    }

    pub fn pages_closed(&self) -> usize {
        self.state.pages_closed.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.state.close_calls.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserEngine for FixtureEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Fixture
    }

    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn new_page(&self) -> Result<Box<dyn PageSession>> {
        if self.is_closed() {
            bail!("fixture browser has already been closed");
        }
        let opened = self.state.pages_opened.load(Ordering::SeqCst);
        if self
            .fixture
            .crash_after_pages
            .is_some_and(|limit| opened >= limit)
        {
            bail!("fixture browser crashed after {opened} page(s)");
        }
        self.state.pages_opened.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(FixturePageSession {
            fixture: Arc::clone(&self.fixture),
            state: Arc::clone(&self.state),
            events: Mutex::new(None),
        }))
    }

    async fn close(&self) -> Result<()> {
        self.state.close_calls.fetch_add(1, Ordering::SeqCst);
        self.state.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

struct FixturePageSession {
    fixture: Arc<Fixture>,
    state: Arc<EngineState>,
    events: Mutex<Option<mpsc::UnboundedSender<CapturedRequest>>>,
}

impl FixturePageSession {
    fn take_sender(&self) -> Option<mpsc::UnboundedSender<CapturedRequest>> {
        self.events
            .lock()
            .map(|mut guard| guard.take())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PageSession for FixturePageSession {
    async fn set_viewport(&self, viewport: &ViewportSpec) -> Result<()> {
        tracing::trace!(target: "conforma_engines", viewport = %viewport, "fixture viewport");
        Ok(())
    }

    async fn request_events(&self) -> Result<RequestEventStream> {
        let (tx, rx) = mpsc::unbounded();
        let mut guard = self
            .events
            .lock()
            .map_err(|_| anyhow!("fixture event lock poisoned"))?;
        *guard = Some(tx);
        Ok(rx.boxed())
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        let page = self.fixture.pages.get(url);

        // Dropping the sender ends the event stream once the load is replayed.
        if let Some(sender) = self.take_sender() {
            for request in page.map(|page| page.requests.as_slice()).unwrap_or_default() {
                let _ = sender.unbounded_send(request.clone());
            }
        }

        let Some(page) = page else {
            bail!("net::ERR_NAME_NOT_RESOLVED at {url}");
        };
        if page.hang {
            futures::future::pending::<()>().await;
        }
        if let Some(error) = &page.navigation_error {
            bail!("{error} at {url}");
        }
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.state.pages_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Serves the fixture's `resources` table in place of real downloads.
#[derive(Debug, Clone)]
pub struct FixtureFetcher {
    fixture: Arc<Fixture>,
}

impl FixtureFetcher {
    pub fn new(fixture: Fixture) -> Self {
        Self::from_shared(Arc::new(fixture))
    }

    pub fn from_shared(fixture: Arc<Fixture>) -> Self {
        Self { fixture }
    }
}

#[async_trait]
impl ResourceFetcher for FixtureFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedResource> {
        let resource = self
            .fixture
            .resources
            .get(url)
            .ok_or_else(|| anyhow!("no fixture resource recorded for {url}"))?;
        Ok(FetchedResource {
            url: url.to_string(),
            size_bytes: resource.size_bytes,
            content_type: resource.content_type.clone(),
        })
    }
}
