//! Outbound HTTP client.
//!
//! One pooled client is shared by every destination and every inbound
//! request. Connections to the same host are reused when the destination
//! keeps them alive.

use std::time::Duration;

use crate::config::TimeoutConfig;

const USER_AGENT: &str = concat!("json-relay/", env!("CARGO_PKG_VERSION"));

/// Build the shared outbound client with the configured deadlines.
pub fn build_client(timeouts: &TimeoutConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .timeout(Duration::from_secs(timeouts.outbound_secs))
        .build()
}
