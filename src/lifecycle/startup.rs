//! Startup orchestration.
//!
//! # Responsibilities
//! - Compile the destination registry from validated configuration
//! - Probe credential files so misconfiguration shows up in the logs early
//! - Build the shared outbound client
//!
//! # Design Decisions
//! - Fail fast: an uncompilable template is fatal
//! - Unreadable credential files only warn; they are read per request
//! - Listeners start last (traffic only when ready)

use crate::destination::{CredentialResolver, DestinationRegistry};
use crate::dispatch::{build_client, Dispatcher};
use crate::config::RelayConfig;
use crate::template::CompileError;

/// Error that prevents the relay from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("failed to build outbound HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Compile every destination and build the dispatcher that serves them.
pub fn build_dispatcher(config: &RelayConfig) -> Result<Dispatcher, StartupError> {
    let registry = DestinationRegistry::from_config(&config.destinations)?;
    let client = build_client(&config.timeouts)?;
    Ok(Dispatcher::new(registry, client))
}

/// Warn about credential files that cannot be read right now.
///
/// Returns the number of destinations whose files failed the probe.
pub async fn probe_credentials(registry: &DestinationRegistry) -> usize {
    let resolver = CredentialResolver::new();
    let mut unreadable = 0;

    for destination in registry.iter() {
        let Some(auth) = &destination.auth else {
            continue;
        };
        if let Err(e) = resolver.probe(auth).await {
            unreadable += 1;
            tracing::warn!(
                destination = %destination.name,
                stage = "credentials",
                error = %e,
                "Credential file not readable; events will fail until it is"
            );
        }
    }

    unreadable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthConfig, BasicAuthConfig, BodyConfig, DestinationConfig};

    #[test]
    fn test_compile_error_is_fatal() {
        let mut config = RelayConfig::default();
        config.destinations.insert(
            "broken".into(),
            DestinationConfig {
                url: "http://localhost/".into(),
                body: Some(BodyConfig {
                    templates: vec!["{{ unclosed".into()],
                }),
                ..Default::default()
            },
        );

        assert!(matches!(build_dispatcher(&config), Err(StartupError::Compile(_))));
    }

    #[tokio::test]
    async fn test_probe_counts_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("user"), "u").unwrap();
        std::fs::write(dir.path().join("pass"), "p").unwrap();

        let mut config = RelayConfig::default();
        for (name, password_file) in [("ok", "pass"), ("missing", "nope")] {
            config.destinations.insert(
                name.into(),
                DestinationConfig {
                    url: "http://localhost/".into(),
                    auth: Some(AuthConfig {
                        basic: Some(BasicAuthConfig {
                            username_file: dir.path().join("user"),
                            password_file: dir.path().join(password_file),
                        }),
                    }),
                    ..Default::default()
                },
            );
        }

        let dispatcher = build_dispatcher(&config).unwrap();
        assert_eq!(probe_credentials(dispatcher.registry()).await, 1);
    }
}
