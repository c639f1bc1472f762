use std::future::Future;
use std::time::Duration;

use futures::{Stream, StreamExt};

use crate::request::CapturedRequest;

/// Trial-scoped log of every request a page issued.
///
/// The interceptor only observes. Engines feed it from passive request
/// events, so a request is never held, rewritten or failed on its behalf.
#[derive(Debug, Default)]
pub struct NetworkInterceptor {
    requests: Vec<CapturedRequest>,
}

impl NetworkInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, request: CapturedRequest) {
        tracing::trace!(
            target: "conforma_network",
            url = %request.url,
            resource_type = %request.resource_type,
            "request captured"
        );
        self.requests.push(request);
    }

    /// Drives `operation` and the request event stream on the current task.
    ///
    /// Events are recorded while the operation is pending. Once it resolves,
    /// the stream keeps being drained until it ends or stays quiet for
    /// `settle`, so requests fired right after the load event still land in
    /// the log. Draining never lasts longer than `max_settle` in total, even
    /// for pages that poll or beacon without pause. The operation's own
    /// output is returned untouched; a failed navigation still leaves
    /// everything captured before the failure.
    pub async fn capture_while<S, F>(
        &mut self,
        events: &mut S,
        operation: F,
        settle: Duration,
        max_settle: Duration,
    ) -> F::Output
    where
        S: Stream<Item = CapturedRequest> + Unpin,
        F: Future,
    {
        tokio::pin!(operation);
        let mut events_open = true;

        let output = loop {
            tokio::select! {
                biased;
                output = &mut operation => break output,
                next = events.next(), if events_open => match next {
                    Some(request) => self.record(request),
                    None => events_open = false,
                },
            }
        };

        if events_open {
            let deadline = tokio::time::Instant::now() + max_settle;
            let drain = async {
                while let Ok(Some(request)) = tokio::time::timeout(settle, events.next()).await {
                    self.record(request);
                }
            };
            if tokio::time::timeout_at(deadline, drain).await.is_err() {
                tracing::debug!(
                    target: "conforma_network",
                    max_settle_ms = max_settle.as_millis() as u64,
                    "page never went quiet; capture cut off"
                );
            }
        }

        tracing::debug!(
            target: "conforma_network",
            requests = self.requests.len(),
            "capture finished"
        );
        output
    }

    pub fn requests(&self) -> &[CapturedRequest] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn into_requests(self) -> Vec<CapturedRequest> {
        self.requests
    }
}
