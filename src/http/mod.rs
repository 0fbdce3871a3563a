//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, trace, timeout)
//!     → request.rs (scope the caller's session)
//!     → catalog handlers → ProductsFacade
//!     → response.rs (CatalogError → status + JSON body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::ApiError;
pub use server::{AppState, HttpServer};
