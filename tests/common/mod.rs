//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use product_catalog::config::{AuthMode, BackendKind, CatalogConfig};

pub const CLIENT_TOKEN: &str = "client-token-123";

/// Config pointing both the Products API and the authority at `server`,
/// with retry delays short enough for real-time tests.
pub fn config_for(server: &MockServer) -> CatalogConfig {
    config_for_uri(&server.uri())
}

pub fn config_for_uri(uri: &str) -> CatalogConfig {
    let mut config = CatalogConfig::default();
    config.products_api.base_url = format!("{}/", uri);
    config.products_api.backend = BackendKind::Remote;
    config.products_api.timeout_secs = 2;
    config.products_api.total_timeout_secs = 10;
    config.auth.mode = AuthMode::ClientCredentials;
    config.auth.authority = uri.to_string();
    config.auth.client_id = "catalog-tests".into();
    config.auth.client_secret = "s3cret".into();
    config.auth.audience = "https://products.example".into();
    config.retries.base_delay_ms = 10;
    config
}

/// Token endpoint answering every exchange with [`CLIENT_TOKEN`].
pub async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": CLIENT_TOKEN,
            "token_type": "Bearer",
            "expires_in": 86400
        })))
        .mount(server)
        .await;
}

/// A product body as the Products API would send it.
pub fn product_json(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": format!("{} description", name),
        "price": 19.99,
        "stockStatus": "In Stock",
        "stockLevel": 5,
        "lastUpdated": "2024-03-01T10:30:00Z",
        "categoryId": 2
    })
}

/// Requests the server has seen for `path`.
pub async fn hits(server: &MockServer, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == request_path)
        .count()
}

/// Raw HTTP backend. The first `truncated` connections get a response that
/// promises more body than it sends before the socket is closed; later ones
/// get `body` in full. Returns the address and a count of served connections.
pub async fn start_truncating_backend(
    truncated: usize,
    body: String,
) -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let served = Arc::new(AtomicUsize::new(0));
    let counter = served.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            let body = body.clone();
            tokio::spawn(async move {
                read_request_head(&mut socket).await;
                let response = if n < truncated {
                    format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
                        body.len() + 64,
                        &body[..body.len() / 2]
                    )
                } else {
                    format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    )
                };
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, served)
}

async fn read_request_head(socket: &mut TcpStream) {
    let mut head = Vec::new();
    let mut chunk = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&chunk[..n]),
        }
    }
}
