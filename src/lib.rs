//! JSON event relay library.
//!
//! Accepts JSON events over HTTP and forwards each one to every configured
//! destination, with per-destination body templates and basic auth.

pub mod config;
pub mod destination;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod template;

pub use config::schema::RelayConfig;
pub use dispatch::Dispatcher;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
