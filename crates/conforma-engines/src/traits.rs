use async_trait::async_trait;
use conforma_network::CapturedRequest;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::viewport::ViewportSpec;

/// Requests a page reports while it loads, in the order they were issued.
pub type RequestEventStream = BoxStream<'static, CapturedRequest>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Chromium,
    Fixture,
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            EngineKind::Chromium => "chromium",
            EngineKind::Fixture => "fixture",
        };
        write!(f, "{label}")
    }
}

/// A running browser process that can hand out pages.
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    fn kind(&self) -> EngineKind;
    fn name(&self) -> &'static str;
    async fn new_page(&self) -> anyhow::Result<Box<dyn PageSession>>;
    /// Releases the browser process. Calling it again is a no-op.
    async fn close(&self) -> anyhow::Result<()>;
}

/// One browser tab used for a single trial.
#[async_trait]
pub trait PageSession: Send + Sync {
    async fn set_viewport(&self, viewport: &ViewportSpec) -> anyhow::Result<()>;
    /// Subscribes to outgoing requests. Must be called before `navigate`
    /// for the navigation's requests to be observed.
    async fn request_events(&self) -> anyhow::Result<RequestEventStream>;
    async fn navigate(&self, url: &str) -> anyhow::Result<()>;
    async fn close(self: Box<Self>) -> anyhow::Result<()>;
}
