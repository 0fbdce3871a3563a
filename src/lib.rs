//! Product catalog service library.
//!
//! A typed, resilient facade over a remote Products API, plus the thin HTTP
//! surface that serves it.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use catalog::{CatalogError, Product, ProductInput, ProductsFacade};
pub use config::schema::CatalogConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
