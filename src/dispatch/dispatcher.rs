//! Fan-out of one inbound event to every destination.
//!
//! # Responsibilities
//! - Render, authenticate and build one request per destination
//! - Send all requests concurrently and wait for every one of them
//! - Apply the failure policy: preparation errors fail the event,
//!   delivery errors are logged and isolated
//!
//! # Design Decisions
//! - Two phases: nothing is sent until every destination has prepared, so a
//!   broken template never produces a partial fan-out
//! - The first preparation error drops all other in-progress preparations
//! - Response status is not inspected; any HTTP response counts as delivered
//! - No retries, no acknowledgements, no persistence

use std::time::Instant;

use futures_util::future::{join_all, try_join_all};
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;

use crate::destination::{
    build_request, BuildError, CredentialReadError, CredentialResolver, Destination, DestinationRegistry,
};
use crate::observability::metrics::{self, DeliveryOutcome};
use crate::template::{EventContext, RenderError};

/// Failure that aborts a whole inbound event.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("destination {destination}: {source}")]
    Credentials {
        destination: String,
        #[source]
        source: CredentialReadError,
    },

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("dispatch cancelled")]
    Cancelled,
}

impl DispatchError {
    /// Pipeline stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            DispatchError::Render(_) => "render",
            DispatchError::Credentials { .. } => "credentials",
            DispatchError::Build(_) => "build",
            DispatchError::Cancelled => "cancelled",
        }
    }

    pub fn destination(&self) -> Option<&str> {
        match self {
            DispatchError::Render(e) => Some(&e.destination),
            DispatchError::Credentials { destination, .. } => Some(destination),
            DispatchError::Build(e) => Some(&e.destination),
            DispatchError::Cancelled => None,
        }
    }
}

/// Failure delivering to a single destination.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("destination {destination}: request failed: {source}")]
    Transport {
        destination: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("destination {destination}: request cancelled")]
    Cancelled { destination: String },
}

/// Result of sending to one destination.
#[derive(Debug)]
pub struct Delivery {
    pub destination: String,
    pub result: Result<StatusCode, SendError>,
}

/// Per-destination results of one dispatch.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub deliveries: Vec<Delivery>,
}

impl DispatchReport {
    pub fn delivered(&self) -> usize {
        self.deliveries.iter().filter(|d| d.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.deliveries.len() - self.delivered()
    }

    pub fn get(&self, destination: &str) -> Option<&Delivery> {
        self.deliveries.iter().find(|d| d.destination == destination)
    }
}

/// A built request waiting for the send phase.
#[derive(Debug)]
pub struct PreparedRequest<'a> {
    pub destination: &'a str,
    pub request: reqwest::Request,
}

/// Dispatches inbound events across the destination registry.
#[derive(Debug)]
pub struct Dispatcher {
    registry: DestinationRegistry,
    client: reqwest::Client,
    credentials: CredentialResolver,
}

impl Dispatcher {
    pub fn new(registry: DestinationRegistry, client: reqwest::Client) -> Self {
        Self {
            registry,
            client,
            credentials: CredentialResolver::new(),
        }
    }

    pub fn registry(&self) -> &DestinationRegistry {
        &self.registry
    }

    /// Fan `event` out to every destination.
    ///
    /// `cancel` aborts preparation and every in-flight send when it fires.
    pub async fn dispatch(
        &self,
        event: &EventContext,
        cancel: &CancellationToken,
    ) -> Result<DispatchReport, DispatchError> {
        let start = Instant::now();
        let result = self.fan_out(event, cancel).await;
        metrics::record_dispatch_duration(start);
        result
    }

    async fn fan_out(&self, event: &EventContext, cancel: &CancellationToken) -> Result<DispatchReport, DispatchError> {
        let prepared = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DispatchError::Cancelled),
            prepared = try_join_all(self.registry.iter().map(|d| self.prepare(d, event))) => prepared?,
        };

        let deliveries = join_all(prepared.into_iter().map(|p| self.send(p, cancel))).await;

        let report = DispatchReport { deliveries };
        tracing::debug!(
            destinations = report.deliveries.len(),
            delivered = report.delivered(),
            failed = report.failed(),
            "Dispatch complete"
        );
        Ok(report)
    }

    /// Render, resolve credentials and build the request for one destination.
    pub async fn prepare<'a>(
        &self,
        destination: &'a Destination,
        event: &EventContext,
    ) -> Result<PreparedRequest<'a>, DispatchError> {
        let rendered = self
            .registry
            .renderer()
            .render(&destination.chain, event)
            .inspect_err(|e| {
                tracing::error!(
                    destination = %destination.name,
                    stage = "render",
                    step = e.index,
                    error = %e.source,
                    "Failed to execute body template"
                )
            })?;

        let credentials = match &destination.auth {
            Some(auth) => Some(self.credentials.resolve(auth).await.map_err(|source| {
                tracing::error!(
                    destination = %destination.name,
                    stage = "credentials",
                    field = %source.field,
                    path = %source.path.display(),
                    error = %source.source,
                    "Failed to read basic auth file"
                );
                DispatchError::Credentials {
                    destination: destination.name.clone(),
                    source,
                }
            })?),
            None => None,
        };

        let request = build_request(destination, rendered.into_body(), credentials.as_ref()).inspect_err(|e| {
            tracing::error!(
                destination = %destination.name,
                stage = "build",
                error = %e.reason,
                "Failed to create HTTP request"
            )
        })?;

        Ok(PreparedRequest {
            destination: &destination.name,
            request,
        })
    }

    async fn send(&self, prepared: PreparedRequest<'_>, cancel: &CancellationToken) -> Delivery {
        let PreparedRequest { destination, request } = prepared;
        let method = request.method().clone();
        let url = request.url().clone();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SendError::Cancelled {
                destination: destination.to_string(),
            }),
            response = self.client.execute(request) => response
                .map(|response| response.status())
                .map_err(|source| SendError::Transport {
                    destination: destination.to_string(),
                    source,
                }),
        };

        let outcome = match &result {
            Ok(status) => {
                if status.is_success() {
                    tracing::debug!(destination, %method, %url, status = status.as_u16(), "Delivered");
                } else {
                    tracing::warn!(
                        destination,
                        %method,
                        %url,
                        status = status.as_u16(),
                        "Destination answered with non-success status"
                    );
                }
                DeliveryOutcome::Delivered
            }
            Err(SendError::Cancelled { .. }) => {
                tracing::warn!(destination, stage = "send", %url, "Send cancelled");
                DeliveryOutcome::Cancelled
            }
            Err(SendError::Transport { source, .. }) => {
                tracing::error!(destination, stage = "send", %method, %url, error = %source, "Failed to send HTTP request");
                DeliveryOutcome::Failed
            }
        };
        metrics::record_delivery(destination, outcome);

        Delivery {
            destination: destination.to_string(),
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BodyConfig, DestinationConfig};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn registry(entries: &[(&str, &str, &[&str])]) -> DestinationRegistry {
        let configs: BTreeMap<String, DestinationConfig> = entries
            .iter()
            .map(|(name, url, templates)| {
                (
                    name.to_string(),
                    DestinationConfig {
                        method: "POST".into(),
                        url: url.to_string(),
                        body: Some(BodyConfig {
                            templates: templates.iter().map(|t| t.to_string()).collect(),
                        }),
                        ..Default::default()
                    },
                )
            })
            .collect();
        DestinationRegistry::from_config(&configs).unwrap()
    }

    fn dispatcher(registry: DestinationRegistry) -> Dispatcher {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        Dispatcher::new(registry, client)
    }

    #[tokio::test]
    async fn test_prepare_renders_body() {
        let dispatcher = dispatcher(registry(&[(
            "d1",
            "http://127.0.0.1:9/",
            &["{{ body.msg }}", "prefix-{{ executedTemplates[0] }}"],
        )]));
        let destination = dispatcher.registry().get("d1").unwrap();

        let prepared = dispatcher
            .prepare(destination, &EventContext::new(json!({"msg": "hi"})))
            .await
            .unwrap();

        assert_eq!(prepared.destination, "d1");
        let body = prepared.request.body().and_then(|b| b.as_bytes());
        assert_eq!(body, Some(&b"prefix-hi"[..]));
    }

    #[tokio::test]
    async fn test_render_error_aborts_before_sending() {
        let dispatcher = dispatcher(registry(&[
            ("a-unreachable", "http://127.0.0.1:1/", &[]),
            ("b-broken", "http://127.0.0.1:1/", &["{{ body.missing }}"]),
        ]));

        let err = dispatcher
            .dispatch(&EventContext::new(json!({})), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), "render");
        assert_eq!(err.destination(), Some("b-broken"));
    }

    #[tokio::test]
    async fn test_missing_credentials_abort() {
        let dir = tempfile::tempdir().unwrap();
        let mut configs = BTreeMap::new();
        configs.insert(
            "secured".to_string(),
            DestinationConfig {
                method: "POST".into(),
                url: "http://127.0.0.1:1/".into(),
                auth: Some(crate::config::AuthConfig {
                    basic: Some(crate::config::BasicAuthConfig {
                        username_file: dir.path().join("user"),
                        password_file: dir.path().join("pass"),
                    }),
                }),
                ..Default::default()
            },
        );
        let dispatcher = dispatcher(DestinationRegistry::from_config(&configs).unwrap());

        let err = dispatcher
            .dispatch(&EventContext::new(json!({})), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.stage(), "credentials");
        assert_eq!(err.destination(), Some("secured"));
    }

    #[tokio::test]
    async fn test_send_failure_is_isolated() {
        let dispatcher = dispatcher(registry(&[
            ("d2", "http://127.0.0.1:1/", &["{{ body.msg }}"]),
            ("d3", "http://127.0.0.1:1/other", &[]),
        ]));

        let report = dispatcher
            .dispatch(&EventContext::new(json!({"msg": "hi"})), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.deliveries.len(), 2);
        assert_eq!(report.failed(), 2);
        assert!(matches!(
            report.get("d2").unwrap().result,
            Err(SendError::Transport { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancelled_before_dispatch() {
        let dispatcher = dispatcher(registry(&[("d1", "http://127.0.0.1:1/", &[])]));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = dispatcher
            .dispatch(&EventContext::new(json!({})), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Cancelled));
    }

    #[tokio::test]
    async fn test_empty_registry_dispatches_nothing() {
        let dispatcher = dispatcher(DestinationRegistry::empty());
        let report = dispatcher
            .dispatch(&EventContext::new(json!({})), &CancellationToken::new())
            .await
            .unwrap();
        assert!(report.deliveries.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_aborts_in_flight_send() {
        // Accepts connections into the backlog and never answers.
        let silent = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", silent.local_addr().unwrap());
        let dispatcher = dispatcher(registry(&[("slow", url.as_str(), &[])]));

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let report = dispatcher
            .dispatch(&EventContext::new(json!({})), &cancel)
            .await
            .unwrap();

        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(matches!(
            &report.get("slow").unwrap().result,
            Err(SendError::Cancelled { destination }) if destination == "slow"
        ));
        drop(silent);
    }

    /// Records the names of histograms touched while installed.
    #[derive(Default)]
    struct HistogramNames(Arc<Mutex<Vec<String>>>);

    impl ::metrics::Recorder for HistogramNames {
        fn describe_counter(&self, _: ::metrics::KeyName, _: Option<::metrics::Unit>, _: ::metrics::SharedString) {}
        fn describe_gauge(&self, _: ::metrics::KeyName, _: Option<::metrics::Unit>, _: ::metrics::SharedString) {}
        fn describe_histogram(&self, _: ::metrics::KeyName, _: Option<::metrics::Unit>, _: ::metrics::SharedString) {}

        fn register_counter(&self, _: &::metrics::Key, _: &::metrics::Metadata<'_>) -> ::metrics::Counter {
            ::metrics::Counter::noop()
        }

        fn register_gauge(&self, _: &::metrics::Key, _: &::metrics::Metadata<'_>) -> ::metrics::Gauge {
            ::metrics::Gauge::noop()
        }

        fn register_histogram(&self, key: &::metrics::Key, _: &::metrics::Metadata<'_>) -> ::metrics::Histogram {
            self.0.lock().unwrap().push(key.name().to_string());
            ::metrics::Histogram::noop()
        }
    }

    fn dispatch_with_recorder(dispatcher: &Dispatcher, cancel: &CancellationToken) -> Vec<String> {
        let recorder = HistogramNames::default();
        let names = recorder.0.clone();
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();

        ::metrics::with_local_recorder(&recorder, || {
            let _ = runtime.block_on(dispatcher.dispatch(&EventContext::new(json!({})), cancel));
        });

        let names = names.lock().unwrap().clone();
        names
    }

    #[test]
    fn test_duration_recorded_for_failed_and_cancelled_dispatches() {
        let broken = dispatcher(registry(&[("broken", "http://127.0.0.1:1/", &["{{ body.missing }}"])]));
        let names = dispatch_with_recorder(&broken, &CancellationToken::new());
        assert!(names.iter().any(|n| n == "relay_dispatch_duration_seconds"));

        let cancelled = CancellationToken::new();
        cancelled.cancel();
        let idle = dispatcher(DestinationRegistry::empty());
        let names = dispatch_with_recorder(&idle, &cancelled);
        assert!(names.iter().any(|n| n == "relay_dispatch_duration_seconds"));
    }
}
