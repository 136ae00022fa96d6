//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Answer liveness probes and hand POSTed events to the dispatcher
//! - Serve until shutdown, then drain for a bounded grace period

use std::future::IntoFuture;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    serve::Listener,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::Instrument;

use crate::config::RelayConfig;
use crate::dispatch::{DispatchError, Dispatcher};
use crate::http::ingest::event_from_parts;
use crate::http::request::{request_id, MakeRequestUuidV4, X_REQUEST_ID};
use crate::http::response::ApiError;
use crate::lifecycle::Shutdown;
use crate::net::listener::BoundedListener;
use crate::observability::metrics::{self, EventOutcome};

const FORCED_DRAIN: Duration = Duration::from_secs(1);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub shutdown: Shutdown,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
    shutdown: Shutdown,
}

impl HttpServer {
    /// Create a new HTTP server serving `dispatcher`.
    pub fn new(config: RelayConfig, dispatcher: Dispatcher, shutdown: Shutdown) -> Self {
        let state = AppState {
            dispatcher: Arc::new(dispatcher),
            shutdown: shutdown.clone(),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            shutdown,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(liveness).post(ingest).head(method_not_allowed))
            .route("/{*path}", get(liveness).post(ingest).head(method_not_allowed))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.listener.max_body_bytes))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Run the server until shutdown is triggered and in-flight requests drain.
    ///
    /// Requests still running after `shutdown_grace_secs` are cancelled.
    pub async fn run(self, listener: BoundedListener) -> Result<(), io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            max_connections = listener.max_connections(),
            "HTTP server starting"
        );

        let stop_accepting = self.shutdown.subscribe();
        let serve = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { stop_accepting.cancelled().await });
        let mut server = tokio::spawn(serve.into_future());

        let shutdown_started = self.shutdown.subscribe();
        tokio::select! {
            result = &mut server => {
                tracing::info!("HTTP server stopped");
                return result.map_err(io::Error::other)?;
            }
            _ = shutdown_started.cancelled() => {}
        }

        let grace = Duration::from_secs(self.config.timeouts.shutdown_grace_secs);
        tracing::info!(grace_secs = grace.as_secs(), "Draining in-flight requests");

        match tokio::time::timeout(grace, &mut server).await {
            Ok(result) => result.map_err(io::Error::other)??,
            Err(_) => {
                tracing::warn!("Grace period elapsed, cancelling in-flight dispatches");
                self.shutdown.force();
                // Cancelled handlers still answer 503 before the task goes away.
                if tokio::time::timeout(FORCED_DRAIN, &mut server).await.is_err() {
                    server.abort();
                }
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Liveness probe.
async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// HEAD is not implied by GET here.
async fn method_not_allowed() -> StatusCode {
    StatusCode::METHOD_NOT_ALLOWED
}

/// Decode one event and fan it out.
async fn ingest(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = request_id(&headers).to_string();

    let value: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Failed to decode request body");
            metrics::record_event(EventOutcome::Rejected);
            return ApiError::bad_request(e, "failed to decode request body").into_response();
        }
    };

    let event = event_from_parts(&method, &uri, &headers, value);
    tracing::info!(request_id = %request_id, path = %event.path, body = %event.body, "Event received");

    let cancel = state.shutdown.request_token();
    let span = tracing::info_span!("dispatch", request_id = %request_id);
    let result = match state.dispatcher.dispatch(&event, &cancel).instrument(span).await {
        // Sends cut short by a forced shutdown are not a successful fan-out.
        Ok(_) if cancel.is_cancelled() => Err(DispatchError::Cancelled),
        other => other,
    };

    match result {
        Ok(_) => {
            metrics::record_event(EventOutcome::Dispatched);
            StatusCode::OK.into_response()
        }
        Err(e) => {
            tracing::warn!(
                request_id = %request_id,
                stage = e.stage(),
                destination = e.destination().unwrap_or("-"),
                "Event rejected"
            );
            metrics::record_event(EventOutcome::Failed);
            ApiError::from(&e).into_response()
        }
    }
}
