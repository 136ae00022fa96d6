//! Destination subsystem.
//!
//! # Data Flow
//! ```text
//! startup:  DestinationConfig map → registry.rs → DestinationRegistry (immutable)
//!
//! request:  Destination + rendered body
//!             → credentials.rs (read secret files, if auth configured)
//!             → request.rs (method, URL, body, auth, static headers)
//!             → reqwest::Request ready to send
//! ```

pub mod credentials;
pub mod registry;
pub mod request;

pub use credentials::{BasicAuth, CredentialField, CredentialReadError, CredentialResolver, Credentials};
pub use registry::{Destination, DestinationRegistry};
pub use request::{build_request, BuildError, InvalidTarget};
