//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    Router,
};
use tokio::net::TcpListener;

use json_relay::config::{parse_config, RelayConfig};
use json_relay::destination::DestinationRegistry;
use json_relay::net::BoundedListener;
use json_relay::{Dispatcher, HttpServer, Shutdown};

/// One request as seen by a mock destination.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Recorded {
    pub fn body_str(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|v| v.to_str().unwrap())
    }

    pub fn header_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .get_all(name)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect()
    }
}

/// A destination that records every request and answers with a fixed status.
#[derive(Clone)]
pub struct MockDestination {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockDestination {
    pub async fn start() -> Self {
        Self::start_with_status(StatusCode::OK).await
    }

    pub async fn start_with_status(status: StatusCode) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .fallback(record)
            .with_state((requests.clone(), status));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, requests }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn record(
    State((requests, status)): State<(Arc<Mutex<Vec<Recorded>>>, StatusCode)>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    requests.lock().unwrap().push(Recorded {
        method,
        uri,
        headers,
        body,
    });
    status
}

/// A destination that accepts connections and never answers.
pub struct SilentDestination {
    listener: TcpListener,
}

impl SilentDestination {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        Self { listener }
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.listener.local_addr().unwrap())
    }
}

/// A relay running on an ephemeral port.
pub struct RunningRelay {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub client: reqwest::Client,
}

impl RunningRelay {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start a relay from TOML destination config text.
pub async fn start_relay(toml: &str) -> RunningRelay {
    let config = parse_config(toml).unwrap();
    start_relay_with_config(config).await
}

pub async fn start_relay_with_config(config: RelayConfig) -> RunningRelay {
    let client = client();
    let registry = DestinationRegistry::from_config(&config.destinations).unwrap();
    let dispatcher = Dispatcher::new(registry, client.clone());

    let inner = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = inner.local_addr().unwrap();
    let listener = BoundedListener::new(inner, config.listener.max_connections);

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, dispatcher, shutdown.clone());
    tokio::spawn(async move {
        server.run(listener).await.unwrap();
    });

    RunningRelay {
        addr,
        shutdown,
        client,
    }
}

/// Client that ignores proxy environment variables.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}
