//! Request handling.
//!
//! # Responsibilities
//! - Make the caller's session available to token providers
//! - Name the request-id header shared by the middleware stack
//!
//! # Design Decisions
//! - The identity layer in front of us has already authenticated the user;
//!   its bearer token is the session token
//! - No session is not an error here; mutating calls fail later with 401

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};

use crate::auth::SessionContext;

/// Header carrying the request id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Run the rest of the stack inside the caller's [`SessionContext`].
pub async fn session_middleware(request: Request<Body>, next: Next) -> Response {
    let session = SessionContext::from_authorization(
        request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok()),
    );

    tracing::trace!(authenticated = session.is_authenticated(), "Session resolved");
    session.scope(next.run(request)).await
}
