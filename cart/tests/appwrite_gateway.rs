//! `AppwriteGateway` against a mock Appwrite server.

#![allow(clippy::unwrap_used)]

use serde_json::json;
use std::num::NonZeroU32;
use std::time::Duration;
use storefront_cart::{
    AppwriteConfig, AppwriteGateway, CartGateway, CartItemId, ErrorKind, GatewayError, UserData,
};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DOCUMENTS: &str = "/databases/main/collections/cart_items/documents";

fn gateway(server: &MockServer) -> AppwriteGateway {
    let config = AppwriteConfig::new(server.uri(), "shop", "main", "cart_items")
        .with_jwt("session-jwt")
        .with_request_timeout(Duration::from_millis(500));
    AppwriteGateway::new(config).unwrap()
}

fn user() -> UserData {
    UserData::new("user-1")
}

#[tokio::test]
async fn load_cart_queries_owned_documents() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DOCUMENTS))
        .and(header("X-Appwrite-Project", "shop"))
        .and(header("X-Appwrite-JWT", "session-jwt"))
        .and(query_param(
            "queries[]",
            json!({"method": "equal", "attribute": "userId", "values": ["user-1"]}).to_string(),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 2,
            "documents": [
                {
                    "$id": "ci-1", "productId": "p-1", "name": "Linen shirt",
                    "image": "https://cdn.example/shirt.png", "price": 12000, "stock": 2,
                    "options": "{\"size\":\"M\"}", "returnable": true, "ordering": true
                },
                {
                    "$id": "ci-2", "productId": "p-2", "name": "Socks",
                    "price": 1500, "stock": 5, "options": ""
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let items = gateway(&server).load_cart(&user()).await.unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].cart_item_id, CartItemId::new("ci-1"));
    assert!(items[0].ordering);
    assert_eq!(items[0].options.get("size").map(String::as_str), Some("M"));
    assert_eq!(items[1].stock.get(), 5);
    assert!(items[1].options.is_empty());
    assert!(!items[1].returnable);
}

#[tokio::test]
async fn ordering_toggle_patches_one_field() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("{DOCUMENTS}/ci-1")))
        .and(body_json(json!({"data": {"ordering": true}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"$id": "ci-1"})))
        .expect(1)
        .mount(&server)
        .await;

    gateway(&server)
        .persist_ordering_toggle(&user(), &CartItemId::new("ci-1"), true)
        .await
        .unwrap();
}

#[tokio::test]
async fn stock_change_patches_one_field() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("{DOCUMENTS}/ci-1")))
        .and(body_json(json!({"data": {"stock": 7}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"$id": "ci-1"})))
        .expect(1)
        .mount(&server)
        .await;

    gateway(&server)
        .persist_stock_change(&user(), &CartItemId::new("ci-1"), NonZeroU32::new(7).unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn delete_removes_the_document() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{DOCUMENTS}/ci-2")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    gateway(&server)
        .delete_cart_item(&user(), &CartItemId::new("ci-2"))
        .await
        .unwrap();
}

#[tokio::test]
async fn stale_write_is_a_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "Document was updated after the request timestamp.",
            "code": 409,
            "type": "document_update_conflict"
        })))
        .mount(&server)
        .await;

    let err = gateway(&server)
        .persist_stock_change(&user(), &CartItemId::new("ci-1"), NonZeroU32::MIN)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(
        err,
        GatewayError::Conflict(
            "HTTP 409: Document was updated after the request timestamp.".to_string()
        )
    );
}

#[tokio::test]
async fn server_errors_and_timeouts_are_transport_failures() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    let id = CartItemId::new("ci-1");

    let err = gateway.delete_cart_item(&user(), &id).await.unwrap_err();
    assert_eq!(err, GatewayError::Transport("HTTP 500: upstream unavailable".to_string()));

    let err = gateway.persist_ordering_toggle(&user(), &id, false).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn malformed_documents_fail_to_decode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DOCUMENTS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "documents": [{"$id": "ci-1", "productId": "p", "name": "n", "price": 1, "stock": 0}]
        })))
        .mount(&server)
        .await;

    let err = gateway(&server).load_cart(&user()).await.unwrap_err();
    assert!(matches!(err, GatewayError::Decode(_)));
    assert_eq!(err.kind(), ErrorKind::Transport);
}
