//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → destinations compiled once into a DestinationRegistry
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - A missing config file means "no destinations", not an error
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_or_default, parse_config, ConfigError};
pub use schema::{
    AuthConfig, BasicAuthConfig, BodyConfig, DestinationConfig, HeaderValues, ListenerConfig,
    LogFormat, ObservabilityConfig, RelayConfig, TimeoutConfig,
};
pub use validation::ValidationError;
