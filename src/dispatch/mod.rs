//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! EventContext
//!     → dispatcher.rs: for every destination, concurrently
//!         render → credentials → build          (any error: abort event)
//!     → dispatcher.rs: for every prepared request, concurrently
//!         send via client.rs                    (any error: log, continue)
//!     → DispatchReport
//! ```

pub mod client;
pub mod dispatcher;

pub use client::build_client;
pub use dispatcher::{Delivery, DispatchError, DispatchReport, Dispatcher, PreparedRequest, SendError};
