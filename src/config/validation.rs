//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check each destination's method, URL, headers and auth paths
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Destination targets are checked with the same parsers the request
//!   builder uses, so a config that validates cannot fail to build

use std::net::SocketAddr;

use crate::config::schema::{DestinationConfig, RelayConfig};
use crate::destination::request::{parse_headers, parse_method, parse_url, InvalidTarget};

/// A single semantic problem in the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("listener.max_connections must be greater than zero")]
    ZeroConnections,

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("destination {destination}: {reason}")]
    Destination {
        destination: String,
        reason: InvalidTarget,
    },

    #[error("destination {0}: basic auth file paths must not be empty")]
    EmptyCredentialPath(String),
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroConnections);
    }

    let timeouts = [
        ("request_secs", config.timeouts.request_secs),
        ("connect_secs", config.timeouts.connect_secs),
        ("outbound_secs", config.timeouts.outbound_secs),
    ];
    for (name, value) in timeouts {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }

    for (name, destination) in &config.destinations {
        validate_destination(name, destination, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_destination(name: &str, destination: &DestinationConfig, errors: &mut Vec<ValidationError>) {
    let mut target_error = |reason| {
        errors.push(ValidationError::Destination {
            destination: name.to_string(),
            reason,
        })
    };

    if let Err(reason) = parse_method(&destination.method) {
        target_error(reason);
    }
    if let Err(reason) = parse_url(&destination.url) {
        target_error(reason);
    }
    if let Err(reason) = parse_headers(&destination.headers) {
        target_error(reason);
    }

    let basic = destination.auth.as_ref().and_then(|auth| auth.basic.as_ref());
    if let Some(basic) = basic {
        if basic.username_file.as_os_str().is_empty() || basic.password_file.as_os_str().is_empty() {
            errors.push(ValidationError::EmptyCredentialPath(name.to_string()));
        }
    }
}
