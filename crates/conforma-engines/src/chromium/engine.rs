use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventRequestWillBeSent, ResourceType as CdpResourceType,
};
use chromiumoxide::Page;
use conforma_network::{CapturedRequest, ResourceType};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::{BrowserEngine, EngineKind, PageSession, RequestEventStream, ViewportSpec};

#[derive(Debug, Clone)]
pub struct ChromiumOptions {
    pub headless: bool,
    /// Binary name looked up on `PATH`, or a path. `None` lets chromiumoxide
    /// detect an installed Chrome/Chromium.
    pub executable: Option<String>,
    pub no_sandbox: bool,
    pub extra_args: Vec<String>,
    pub request_timeout: Duration,
}

impl Default for ChromiumOptions {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            no_sandbox: false,
            extra_args: Vec::new(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Chrome/Chromium driven over the DevTools protocol.
pub struct ChromiumEngine {
    browser: Mutex<Option<Browser>>,
    handler: Mutex<Option<JoinHandle<()>>>,
}

impl ChromiumEngine {
    pub async fn launch(options: ChromiumOptions) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(options.request_timeout)
            .args(options.extra_args.clone());
        if !options.headless {
            builder = builder.with_head();
        }
        if options.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(executable) = options.executable.as_deref() {
            builder = builder.chrome_executable(resolve_executable(executable)?);
        }
        let config = builder
            .build()
            .map_err(|error| anyhow!("invalid chromium configuration: {error}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("launching chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(error) = event {
                    tracing::debug!(
                        target: "conforma_engines",
                        error = %error,
                        "devtools handler error"
                    );
                }
            }
        });

        tracing::info!(
            target: "conforma_engines",
            headless = options.headless,
            "chromium launched"
        );

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            handler: Mutex::new(Some(handler)),
        })
    }
}

fn resolve_executable(executable: &str) -> Result<PathBuf> {
    let candidate = PathBuf::from(executable);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return Ok(candidate);
    }
    which::which(executable).with_context(|| format!("locating browser executable `{executable}`"))
}

#[async_trait]
impl BrowserEngine for ChromiumEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Chromium
    }

    fn name(&self) -> &'static str {
        "chromium"
    }

    async fn new_page(&self) -> Result<Box<dyn PageSession>> {
        let guard = self.browser.lock().await;
        let browser = guard
            .as_ref()
            .ok_or_else(|| anyhow!("chromium has already been closed"))?;
        let page = browser
            .new_page("about:blank")
            .await
            .context("opening chromium page")?;
        Ok(Box::new(ChromiumPage { page }))
    }

    async fn close(&self) -> Result<()> {
        let Some(mut browser) = self.browser.lock().await.take() else {
            return Ok(());
        };

        let closed = browser.close().await.context("closing chromium");
        if let Err(error) = browser.wait().await {
            tracing::warn!(
                target: "conforma_engines",
                error = %error,
                "waiting for chromium to exit failed"
            );
        }
        if let Some(handler) = self.handler.lock().await.take() {
            handler.abort();
        }

        tracing::info!(target: "conforma_engines", "chromium closed");
        closed.map(|_| ())
    }
}

pub struct ChromiumPage {
    page: Page,
}

#[async_trait]
impl PageSession for ChromiumPage {
    async fn set_viewport(&self, viewport: &ViewportSpec) -> Result<()> {
        let params = SetDeviceMetricsOverrideParams::new(
            i64::from(viewport.width),
            i64::from(viewport.height),
            1.0,
            viewport.is_mobile,
        );
        self.page
            .execute(params)
            .await
            .with_context(|| format!("applying viewport {viewport}"))?;
        Ok(())
    }

    async fn request_events(&self) -> Result<RequestEventStream> {
        self.page
            .execute(EnableParams::default())
            .await
            .context("enabling network events")?;
        let events = self
            .page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .context("subscribing to request events")?;
        Ok(events.map(|event| captured_request(&event)).boxed())
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("navigating to {url}"))?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.page.close().await.context("closing chromium page")?;
        Ok(())
    }
}

fn captured_request(event: &EventRequestWillBeSent) -> CapturedRequest {
    let resource_type = match &event.r#type {
        Some(CdpResourceType::Image) => ResourceType::Image,
        Some(CdpResourceType::Font) => ResourceType::Font,
        Some(CdpResourceType::Script) => ResourceType::Script,
        Some(CdpResourceType::Document) => ResourceType::Document,
        _ => ResourceType::Other,
    };

    // Parser-initiated requests carry the initiator URL directly; script
    // initiated ones only expose it through the top call frame.
    let initiator_url = event
        .initiator
        .url
        .clone()
        .or_else(|| {
            event
                .initiator
                .stack
                .as_ref()
                .and_then(|stack| stack.call_frames.first())
                .map(|frame| frame.url.clone())
        })
        .filter(|url| !url.is_empty());

    CapturedRequest {
        url: event.request.url.clone(),
        resource_type,
        initiator_url,
    }
}
