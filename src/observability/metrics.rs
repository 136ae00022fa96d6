//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define relay metrics (events, deliveries, dispatch latency)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `relay_events_total` (counter): inbound events by outcome
//! - `relay_deliveries_total` (counter): outbound sends by destination, outcome
//! - `relay_dispatch_duration_seconds` (histogram): time to fan one event out
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels are bounded: destinations come from config, outcomes are fixed

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Outcome label for an inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Dispatched,
    Rejected,
    Failed,
}

impl EventOutcome {
    fn as_str(self) -> &'static str {
        match self {
            EventOutcome::Dispatched => "dispatched",
            EventOutcome::Rejected => "rejected",
            EventOutcome::Failed => "failed",
        }
    }
}

/// Outcome label for one outbound send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Failed,
    Cancelled,
}

impl DeliveryOutcome {
    fn as_str(self) -> &'static str {
        match self {
            DeliveryOutcome::Delivered => "delivered",
            DeliveryOutcome::Failed => "failed",
            DeliveryOutcome::Cancelled => "cancelled",
        }
    }
}

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_event(outcome: EventOutcome) {
    metrics::counter!("relay_events_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_delivery(destination: &str, outcome: DeliveryOutcome) {
    metrics::counter!(
        "relay_deliveries_total",
        "destination" => destination.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

pub fn record_dispatch_duration(start: Instant) {
    metrics::histogram!("relay_dispatch_duration_seconds").record(start.elapsed().as_secs_f64());
}
