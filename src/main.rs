//! JSON event relay.
//!
//! Receives JSON events over HTTP and forwards each one to every configured
//! destination.
//!
//! # Architecture Overview
//!
//! ```text
//!     Inbound POST
//!     ──────────────▶ net::listener ──▶ http::server ──▶ http::ingest
//!                                                            │
//!                                                            ▼
//!                                                    dispatch::Dispatcher
//!                                                            │
//!                     ┌──────────────────────────────────────┼───────────────────┐
//!                     ▼                                      ▼                   ▼
//!              template::renderer              destination::credentials   destination::request
//!                     └──────────────────────────────────────┬───────────────────┘
//!                                                            ▼
//!                                               one outbound request per destination
//! ```

use std::path::PathBuf;

use clap::Parser;

use json_relay::config::load_config_or_default;
use json_relay::http::HttpServer;
use json_relay::lifecycle::{build_dispatcher, probe_credentials, wait_for_signal, Shutdown};
use json_relay::net::BoundedListener;
use json_relay::observability::{logging::init_logging, metrics::init_metrics};

#[derive(Parser)]
#[command(name = "json-relay")]
#[command(about = "Relay JSON events to templated HTTP destinations", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "RELAY_CONFIG", default_value = "/etc/json-relay/relay.toml")]
    config: PathBuf,

    /// Override the listener bind address.
    #[arg(short, long, env = "RELAY_ADDR")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let (mut config, found) = load_config_or_default(&args.config)?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "json-relay starting");

    if !found {
        tracing::warn!(
            path = %args.config.display(),
            "Config file not found, running with no destinations"
        );
    }

    let dispatcher = build_dispatcher(&config)?;
    probe_credentials(dispatcher.registry()).await;
    tracing::info!(
        destinations = dispatcher.registry().len(),
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = BoundedListener::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.trigger();
    });

    let server = HttpServer::new(config, dispatcher, shutdown);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
