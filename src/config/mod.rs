//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → CatalogConfig (validated, immutable)
//!     → sections cloned into the subsystems that need them
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Secrets can come from the environment instead of the file

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AuthConfig, AuthMode, BackendKind, CatalogConfig, CircuitBreakerConfig, ListenerConfig,
    ObservabilityConfig, ProductsApiConfig, RetryConfig,
};
