//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream call:
//!     → policy.rs (deadline around the whole sequence)
//!     → circuit_breaker.rs (admit, or fail fast while open)
//!     → attempt
//!     → retries.rs (classify outcome; transient → backoff.rs delay → next attempt)
//! ```
//!
//! # Design Decisions
//! - Every outbound sequence has a deadline
//! - Retries only for transient failures (network, 408, 5xx)
//! - Circuit breaker prevents cascading failures
//! - Breaker state is an explicit object, shared per channel via a registry

pub mod backoff;
pub mod circuit_breaker;
pub mod policy;
pub mod retries;

pub use circuit_breaker::{BreakerRegistry, CircuitBreaker, CircuitState};
pub use policy::{PolicyError, ResiliencePolicy};
pub use retries::{RetryPolicy, Verdict};
