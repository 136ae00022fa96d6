//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Compile registry → Probe credentials → Start listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain for the grace period
//!     → Cancel in-flight dispatches → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then core, then listeners
//! - Ordered shutdown: stop accept, drain, cancel
//! - Shutdown has timeout: forced cancellation after deadline

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
pub use startup::{build_dispatcher, probe_credentials, StartupError};
