//! Remote facade against a mock Products API.

use std::str::FromStr;

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use product_catalog::catalog::{
    CatalogError, ProductInput, ProductsFacade, RemoteProducts, StockStatus,
};
use product_catalog::resilience::BreakerRegistry;

mod common;

fn facade(config: &product_catalog::CatalogConfig) -> RemoteProducts {
    let breakers = BreakerRegistry::new(config.circuit_breaker.clone());
    RemoteProducts::from_config(config, &breakers).unwrap()
}

fn widget() -> ProductInput {
    ProductInput {
        name: "Widget".into(),
        description: "A useful widget".into(),
        price: Decimal::from_str("12.50").unwrap(),
        stock_status: StockStatus::InStock,
        stock_level: 7,
        last_updated: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        category_id: 4,
    }
}

#[tokio::test]
async fn test_list_returns_upstream_products_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            common::product_json(3, "Tablet"),
            common::product_json(1, "Laptop"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let products = facade(&common::config_for(&server))
        .list_products()
        .await
        .unwrap();

    let ids: Vec<_> = products.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![3, 1]);
    assert_eq!(products[0].name, "Tablet");
    assert_eq!(products[0].price, Decimal::from_str("19.99").unwrap());
    assert_eq!(products[1].stock_status, StockStatus::InStock);
}

#[tokio::test]
async fn test_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let products = facade(&common::config_for(&server))
        .list_products()
        .await
        .unwrap();
    assert!(products.is_empty());
}

#[tokio::test]
async fn test_get_missing_product_is_not_found_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/42"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = facade(&common::config_for(&server))
        .get_product(42)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(42)));
}

#[tokio::test]
async fn test_invalid_id_makes_no_request() {
    let server = MockServer::start().await;
    let products = facade(&common::config_for(&server));

    assert!(matches!(
        products.get_product(0).await,
        Err(CatalogError::Validation(_))
    ));
    assert!(matches!(
        products.delete_product(-3).await,
        Err(CatalogError::Validation(_))
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/5"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = facade(&common::config_for(&server))
        .get_product(5)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Upstream { status: Some(200), .. }));
}

#[tokio::test]
async fn test_create_sends_bearer_token_and_returns_assigned_id() {
    let server = MockServer::start().await;
    common::mount_token_endpoint(&server).await;

    let mut created = serde_json::to_value(widget()).unwrap();
    created["id"] = json!(101);
    Mock::given(method("POST"))
        .and(path("/products"))
        .and(header("authorization", format!("Bearer {}", common::CLIENT_TOKEN).as_str()))
        .and(body_partial_json(json!({ "name": "Widget", "price": 12.5, "categoryId": 4 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(created))
        .expect(1)
        .mount(&server)
        .await;

    let product = facade(&common::config_for(&server))
        .create_product(widget())
        .await
        .unwrap();

    assert_eq!(product.id, 101);
    assert_eq!(product.to_input(), widget());
}

#[tokio::test]
async fn test_each_mutating_call_fetches_a_fresh_token() {
    let server = MockServer::start().await;
    common::mount_token_endpoint(&server).await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Product has been deleted"))
        .mount(&server)
        .await;

    let products = facade(&common::config_for(&server));
    products.delete_product(1).await.unwrap();
    products.delete_product(2).await.unwrap();

    assert_eq!(common::hits(&server, "/oauth/token").await, 2);
}

#[tokio::test]
async fn test_failed_token_exchange_is_auth_error_and_skips_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = facade(&common::config_for(&server))
        .create_product(widget())
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::Auth(_)));
    assert_eq!(common::hits(&server, "/products").await, 0);
}

#[tokio::test]
async fn test_token_response_without_access_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token_type": "Bearer" })))
        .mount(&server)
        .await;

    let err = facade(&common::config_for(&server))
        .delete_product(1)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Auth(product_catalog::auth::AuthError::MissingAccessToken)
    ));
}

#[tokio::test]
async fn test_delete_is_true_only_with_confirmation_text() {
    let server = MockServer::start().await;
    common::mount_token_endpoint(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/products/1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("Product with ID 1 has been deleted."),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/products/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/products/3"))
        .respond_with(ResponseTemplate::new(400).set_body_string("has been deleted"))
        .mount(&server)
        .await;

    let products = facade(&common::config_for(&server));
    assert!(products.delete_product(1).await.unwrap());
    assert!(!products.delete_product(2).await.unwrap());
    assert!(!products.delete_product(3).await.unwrap());
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/8"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/products/8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::product_json(8, "Mouse")))
        .mount(&server)
        .await;

    let product = facade(&common::config_for(&server))
        .get_product(8)
        .await
        .unwrap();

    assert_eq!(product.name, "Mouse");
    assert_eq!(common::hits(&server, "/products/8").await, 3);
}

#[tokio::test]
async fn test_exhausted_retries_surface_last_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = facade(&common::config_for(&server))
        .list_products()
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::Upstream { status: Some(500), .. }));
    assert_eq!(common::hits(&server, "/products").await, 4);
}

#[tokio::test]
async fn test_slow_upstream_hits_overall_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(std::time::Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let mut config = common::config_for(&server);
    config.products_api.timeout_secs = 1;
    config.products_api.total_timeout_secs = 2;

    let err = facade(&config).list_products().await.unwrap_err();
    assert!(matches!(err, CatalogError::Timeout(d) if d.as_secs() == 2));
}

#[tokio::test]
async fn test_unreachable_upstream_is_upstream_error() {
    let server = MockServer::start().await;
    let mut config = common::config_for(&server);
    config.products_api.base_url = "http://127.0.0.1:9/".into();
    config.retries.max_retries = 1;

    let err = facade(&config).list_products().await.unwrap_err();
    assert!(matches!(err, CatalogError::Upstream { status: None, .. }));
}

#[tokio::test]
async fn test_body_cut_short_is_retried() {
    let body = common::product_json(12, "Keyboard").to_string();
    let (addr, served) = common::start_truncating_backend(2, body).await;

    let config = common::config_for_uri(&format!("http://{}", addr));
    let product = facade(&config).get_product(12).await.unwrap();

    assert_eq!(product.name, "Keyboard");
    assert_eq!(served.load(std::sync::atomic::Ordering::SeqCst), 3);
}
