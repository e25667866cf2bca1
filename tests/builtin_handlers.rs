//! The binary's built-in handlers, wired through the real startup path.

use axum::{routing::post, Json, Router};
use axum::http::StatusCode;
use local_api::config::HandlerKind;
use serde_json::{json, Value};

mod common;

#[tokio::test]
async fn test_echo_handler_404_for_unmatched() {
    let config = common::config_with_routes(&[("items/{id}", "GET")]);
    let (addr, _shutdown) = common::start_configured(config).await;
    let client = common::client();

    let res = client.get(format!("http://{}/items/3", addr)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let event: Value = res.json().await.unwrap();
    assert_eq!(event["pathParameters"]["id"], "3");
    assert!(event["requestContext"]["requestId"].is_string());

    let res = client.delete(format!("http://{}/items/3", addr)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        res.json::<Value>().await.unwrap(),
        json!({"message": "No route for DELETE /items/3"})
    );
}

#[tokio::test]
async fn test_forward_handler_round_trip() {
    let upstream = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let upstream_addr = upstream.local_addr().unwrap();
    let app = Router::new().route(
        "/invoke",
        post(|Json(event): Json<Value>| async move {
            if event["pathParameters"]["id"] == "0" {
                return Json(json!({"errorMessage": "id zero is not allowed"}));
            }
            Json(json!({
                "statusCode": 202,
                "headers": {"X-Resource": event["requestContext"]["resourcePath"]},
                "body": {"id": event["pathParameters"]["id"], "name": event["body"]["name"]}
            }))
        }),
    );
    tokio::spawn(async move {
        axum::serve(upstream, app).await.unwrap();
    });

    let mut config = common::config_with_routes(&[("items/{id}", "PUT")]);
    config.handler.kind = HandlerKind::Forward;
    config.handler.forward_url = Some(format!("http://{}/invoke", upstream_addr));
    let (addr, _shutdown) = common::start_configured(config).await;
    let client = common::client();

    let res = client
        .put(format!("http://{}/items/5", addr))
        .json(&json!({"name": "widget"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    assert_eq!(res.headers()["x-resource"], "/items/{id}");
    assert_eq!(res.json::<Value>().await.unwrap(), json!({"id": "5", "name": "widget"}));

    let res = client.put(format!("http://{}/items/0", addr)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.json::<Value>().await.unwrap(),
        json!({"message": "id zero is not allowed"})
    );
}
