//! Shutdown coordination for the relay.

use tokio_util::sync::CancellationToken;

/// Coordinator for graceful shutdown.
///
/// Two stages: `trigger` asks the listener to stop accepting and drain,
/// `force` cancels every dispatch still in flight.
#[derive(Debug, Clone)]
pub struct Shutdown {
    graceful: CancellationToken,
    in_flight: CancellationToken,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        Self {
            graceful: CancellationToken::new(),
            in_flight: CancellationToken::new(),
        }
    }

    /// Token that fires when graceful shutdown starts.
    pub fn subscribe(&self) -> CancellationToken {
        self.graceful.child_token()
    }

    /// Token for one inbound request; fires when shutdown is forced.
    pub fn request_token(&self) -> CancellationToken {
        self.in_flight.child_token()
    }

    /// Start graceful shutdown.
    pub fn trigger(&self) {
        self.graceful.cancel();
    }

    /// Abort everything still running. Implies `trigger`.
    pub fn force(&self) {
        self.graceful.cancel();
        self.in_flight.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.graceful.is_cancelled()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
