//! Checkout transports, tried in order until one yields a terminal result.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{
    header::{HeaderMap, ACCEPT, CONTENT_TYPE},
    Client,
};
use shared::{
    domain::CheckoutOutcome,
    error::ApiError,
    protocol::{CheckoutExecuteRequest, ExecuteResponse, ProgressEvent},
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{endpoints::ApiEndpoints, sse::ProgressDecoder};

const EVENT_STREAM_MIME: &str = "text/event-stream";

/// Receives progress events in arrival order.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn apply(&self, event: ProgressEvent);
}

/// Sink for callers that only care about the terminal result.
pub struct DiscardProgress;

#[async_trait]
impl ProgressSink for DiscardProgress {
    async fn apply(&self, _event: ProgressEvent) {}
}

/// One way of executing a checkout. `None` means "could not produce a
/// terminal result"; it is never an error for the caller.
#[async_trait]
pub trait CheckoutStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(
        &self,
        request: &CheckoutExecuteRequest,
        sink: &dyn ProgressSink,
    ) -> Option<CheckoutOutcome>;
}

/// POSTs with the streaming flag and consumes server-sent progress frames.
pub struct StreamingCheckout {
    http: Client,
    endpoint: Url,
}

impl StreamingCheckout {
    pub fn new(http: Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }
}

#[async_trait]
impl CheckoutStrategy for StreamingCheckout {
    fn name(&self) -> &'static str {
        "streaming"
    }

    async fn attempt(
        &self,
        request: &CheckoutExecuteRequest,
        sink: &dyn ProgressSink,
    ) -> Option<CheckoutOutcome> {
        let response = match self
            .http
            .post(self.endpoint.clone())
            .header(ACCEPT, EVENT_STREAM_MIME)
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "checkout: streaming request failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            debug!(%status, "checkout: streaming request rejected");
            return None;
        }
        if !is_event_stream(response.headers()) {
            debug!("checkout: backend does not stream progress");
            return None;
        }

        let mut decoder = ProgressDecoder::new();
        let mut chunks = response.bytes_stream();
        while let Some(chunk) = chunks.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => {
                    warn!(error = %err, "checkout: progress stream interrupted");
                    return None;
                }
            };

            for event in decoder.push(&chunk) {
                match event {
                    ProgressEvent::Done(outcome) => return Some(outcome.reconciled()),
                    progress => sink.apply(progress).await,
                }
            }
        }

        decoder.finish();
        warn!("checkout: progress stream ended without a done event");
        None
    }
}

/// Plain JSON request/response against the same endpoint.
pub struct SingleShotCheckout {
    http: Client,
    endpoint: Url,
}

impl SingleShotCheckout {
    pub fn new(http: Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }
}

#[async_trait]
impl CheckoutStrategy for SingleShotCheckout {
    fn name(&self) -> &'static str {
        "single_shot"
    }

    async fn attempt(
        &self,
        request: &CheckoutExecuteRequest,
        _sink: &dyn ProgressSink,
    ) -> Option<CheckoutOutcome> {
        let response = match self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "checkout: request failed");
                return None;
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                warn!(%status, error = %err, "checkout: failed to read response body");
                return None;
            }
        };

        if !status.is_success() {
            let error = serde_json::from_str::<ApiError>(&body)
                .ok()
                .and_then(|body| body.describe())
                .unwrap_or_default();
            warn!(%status, error = %error, "checkout: executor returned an error");
            return None;
        }

        let parsed: ExecuteResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(error = %err, "checkout: invalid executor response");
                return None;
            }
        };

        if parsed.results.is_empty() {
            warn!(
                error = parsed.error.as_deref().unwrap_or_default(),
                message = parsed.message.as_deref().unwrap_or_default(),
                "checkout: executor returned no results"
            );
            return None;
        }

        Some(
            CheckoutOutcome {
                results: parsed.results,
                summary: parsed.summary.unwrap_or_default(),
            }
            .reconciled(),
        )
    }
}

/// Ordered chain of checkout strategies.
pub struct CheckoutTransport {
    strategies: Vec<Arc<dyn CheckoutStrategy>>,
}

impl CheckoutTransport {
    pub fn new(http: Client, endpoints: &ApiEndpoints, streaming: bool) -> Self {
        let mut strategies: Vec<Arc<dyn CheckoutStrategy>> = Vec::with_capacity(2);
        if streaming {
            strategies.push(Arc::new(StreamingCheckout::new(
                http.clone(),
                endpoints.checkout_execute_streaming(),
            )));
        }
        strategies.push(Arc::new(SingleShotCheckout::new(
            http,
            endpoints.checkout_execute().clone(),
        )));
        Self { strategies }
    }

    pub fn with_strategies(strategies: Vec<Arc<dyn CheckoutStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|strategy| strategy.name()).collect()
    }

    pub async fn execute(
        &self,
        request: &CheckoutExecuteRequest,
        sink: &dyn ProgressSink,
    ) -> Option<CheckoutOutcome> {
        for strategy in &self.strategies {
            debug!(strategy = strategy.name(), "checkout: trying strategy");
            if let Some(outcome) = strategy.attempt(request, sink).await {
                info!(
                    strategy = strategy.name(),
                    total = outcome.summary.total,
                    success = outcome.summary.success,
                    failed = outcome.summary.failed,
                    "checkout: backend produced a result"
                );
                return Some(outcome);
            }
        }
        None
    }
}

fn is_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .trim()
                .to_ascii_lowercase()
                .starts_with(EVENT_STREAM_MIME)
        })
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
