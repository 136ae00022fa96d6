//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, liveness)
//!     → request.rs (request ID)
//!     → ingest.rs (JSON body + request metadata → EventContext)
//!     → [dispatcher fans out to destinations]
//!     → response.rs (status + JSON error body)
//!     → Send to client
//! ```

pub mod ingest;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::ApiError;
pub use server::HttpServer;
