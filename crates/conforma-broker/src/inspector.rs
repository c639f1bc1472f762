use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use conforma_engines::{PageSession, RequestEventStream, ViewportSpec};
use conforma_network::{CapturedRequest, NetworkInterceptor, ResourceFetcher};
use conforma_rules::{ImageSample, RuleOutcomes, RuleResult, RuleSet, ValidationReport};
use futures::{FutureExt, StreamExt};
use url::Url;

use crate::batch::PageTarget;

pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_SETTLE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialState {
    Created,
    Navigating,
    Inspecting,
    Reported,
}

impl std::fmt::Display for TrialState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TrialState::Created => "created",
            TrialState::Navigating => "navigating",
            TrialState::Inspecting => "inspecting",
            TrialState::Reported => "reported",
        };
        write!(f, "{label}")
    }
}

/// Runs a single (URL, viewport) trial and turns it into a report.
///
/// A trial always yields a report. Navigation failures leave a partial
/// capture behind, fetch failures drop the affected image, and a panic
/// during inspection keeps whatever rules had already been evaluated.
pub struct PageInspector {
    rules: RuleSet,
    fetcher: Arc<dyn ResourceFetcher>,
    navigation_timeout: Duration,
    settle: Duration,
    max_settle: Duration,
}

impl PageInspector {
    pub fn new(rules: RuleSet, fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self {
            rules,
            fetcher,
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            settle: DEFAULT_SETTLE,
            max_settle: DEFAULT_MAX_SETTLE,
        }
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    /// How long request capture continues after the load completes.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Upper bound on the whole post-load capture, however busy the page.
    pub fn with_max_settle(mut self, max_settle: Duration) -> Self {
        self.max_settle = max_settle;
        self
    }

    pub async fn inspect(
        &self,
        page: Box<dyn PageSession>,
        target: &PageTarget,
        viewport: &ViewportSpec,
    ) -> ValidationReport {
        let mut trial = Trial::new(target, viewport);

        let outcome = AssertUnwindSafe(self.run(page.as_ref(), &mut trial))
            .catch_unwind()
            .await;

        if let Err(error) = page.close().await {
            tracing::warn!(
                target: "conforma_broker",
                url = %target,
                viewport = %viewport.name,
                error = %error,
                "closing page failed"
            );
        }
        trial.transition(TrialState::Reported);

        match outcome {
            Ok(()) => trial.finish(None),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(
                    target: "conforma_broker",
                    url = %target,
                    viewport = %viewport.name,
                    error = %message,
                    "trial aborted during inspection; reporting degraded result"
                );
                trial.finish(Some(message))
            }
        }
    }

    async fn run(&self, page: &dyn PageSession, trial: &mut Trial<'_>) {
        let target = trial.target;

        if let Err(error) = page.set_viewport(trial.viewport).await {
            tracing::warn!(
                target: "conforma_broker",
                url = %target,
                viewport = %trial.viewport.name,
                error = %error,
                "applying viewport failed; continuing with browser default"
            );
        }
        let mut events: RequestEventStream = match page.request_events().await {
            Ok(events) => events,
            Err(error) => {
                tracing::warn!(
                    target: "conforma_broker",
                    url = %target,
                    error = %error,
                    "request listener unavailable; capture will be empty"
                );
                futures::stream::empty().boxed()
            }
        };

        trial.transition(TrialState::Navigating);
        let mut interceptor = NetworkInterceptor::new();
        let navigation = interceptor
            .capture_while(
                &mut events,
                tokio::time::timeout(self.navigation_timeout, page.navigate(target.as_str())),
                self.settle,
                self.max_settle,
            )
            .await;

        let navigation_error = match navigation {
            Ok(Ok(())) => None,
            Ok(Err(error)) => Some(format!("{error:#}")),
            Err(_) => Some(format!(
                "navigation timed out after {}s",
                self.navigation_timeout.as_secs_f64()
            )),
        };
        if let Some(error) = &navigation_error {
            tracing::warn!(
                target: "conforma_broker",
                url = %target,
                viewport = %trial.viewport.name,
                captured = interceptor.len(),
                error = %error,
                "navigation failed; inspecting partial capture"
            );
        }
        trial.navigation_error = navigation_error;

        trial.transition(TrialState::Inspecting);
        let requests = interceptor.into_requests();
        let samples = self.fetch_images(&requests, target.url()).await;

        trial.outcomes.image_extension = Some(self.rules.image_extensions(&samples));
        trial.outcomes.image_weight = Some(self.rules.image_weights(&samples));
        trial.outcomes.html_extension = Some(self.rules.html_extension(target.as_str()));
        trial.outcomes.font = Some(self.rules.fonts(&requests));
        trial.outcomes.external_resource =
            Some(self.rules.external_resources(&requests, target.url()));
    }

    /// Downloads each distinct same-origin image once, in capture order.
    async fn fetch_images(&self, requests: &[CapturedRequest], page_url: &Url) -> Vec<ImageSample> {
        let mut seen = HashSet::new();
        let mut samples = Vec::new();

        for request in self.rules.same_origin_images(requests, page_url) {
            if !seen.insert(request.url.as_str()) {
                continue;
            }
            match self.fetcher.fetch(&request.url).await {
                Ok(resource) => samples.push(ImageSample {
                    url: request.url.clone(),
                    size_bytes: resource.size_bytes,
                }),
                Err(error) => {
                    let message = format!("{error:#}");
                    tracing::warn!(
                        target: "conforma_broker",
                        image = %request.url,
                        error = %message,
                        "image fetch failed; excluded from image rules"
                    );
                }
            }
        }
        samples
    }
}

#[derive(Default)]
struct PartialOutcomes {
    image_extension: Option<RuleResult>,
    image_weight: Option<RuleResult>,
    html_extension: Option<RuleResult>,
    font: Option<RuleResult>,
    external_resource: Option<RuleResult>,
}

struct Trial<'a> {
    target: &'a PageTarget,
    viewport: &'a ViewportSpec,
    state: TrialState,
    navigation_error: Option<String>,
    outcomes: PartialOutcomes,
}

impl<'a> Trial<'a> {
    fn new(target: &'a PageTarget, viewport: &'a ViewportSpec) -> Self {
        let trial = Self {
            target,
            viewport,
            state: TrialState::Created,
            navigation_error: None,
            outcomes: PartialOutcomes::default(),
        };
        tracing::debug!(
            target: "conforma_broker",
            url = %target,
            viewport = %viewport.name,
            state = %trial.state,
            "trial state"
        );
        trial
    }

    fn transition(&mut self, next: TrialState) {
        tracing::debug!(
            target: "conforma_broker",
            url = %self.target,
            viewport = %self.viewport.name,
            from = %self.state,
            to = %next,
            "trial state"
        );
        self.state = next;
    }

    /// Rules that never ran are reported failing against the page itself:
    /// the page could not be verified.
    fn finish(self, trial_error: Option<String>) -> ValidationReport {
        let url = self.target.as_str();
        let unverified = || RuleResult::from_violations(vec![url.to_string()]);
        let outcomes = RuleOutcomes {
            image_extension: self.outcomes.image_extension.unwrap_or_else(unverified),
            image_weight: self.outcomes.image_weight.unwrap_or_else(unverified),
            html_extension: self.outcomes.html_extension.unwrap_or_else(unverified),
            font: self.outcomes.font.unwrap_or_else(unverified),
            external_resource: self.outcomes.external_resource.unwrap_or_else(unverified),
        };

        let mut report = ValidationReport::new(url, &self.viewport.name, outcomes);
        if let Some(error) = self.navigation_error {
            report = report.with_navigation_error(error);
        }
        if let Some(error) = trial_error {
            report = report.with_trial_error(error);
        }
        report
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "trial panicked".to_string()
    }
}
