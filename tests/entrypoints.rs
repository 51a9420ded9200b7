//! The deployed entrypoints, end to end.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use ephemeral_app::app;
use ephemeral_app::http::render;
use ephemeral_app::{Container, Dispatch, Entrypoint};

mod common;
use common::{body_json, get, request};

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_entrypoint() {
    let entry = app::health_entrypoint();
    for path in ["/", "/health"] {
        let response = entry.handle(get(path)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"ok": true}));
    }

    let response = entry.handle(get("/nope")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_jobs_introspection_lists_example_cron() {
    let response = app::jobs_entrypoint().handle(get("/api/inngest")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["function_count"], 1);
    assert_eq!(body["functions"][0]["id"], "example-cron");
    assert_eq!(body["functions"][0]["name"], "Example Cron");
    assert_eq!(body["functions"][0]["triggers"][0]["cron"], "0 * * * *");
}

#[tokio::test]
async fn test_jobs_invocation() {
    let entry = app::jobs_entrypoint();

    let response = entry
        .handle(post_json("/api/inngest?fnId=example-cron", json!({"name": "tick"})))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"ok": true}));

    let response = entry.handle(request(Method::PUT, "/api/inngest?fnId=example-cron")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_jobs_errors_use_the_envelope() {
    let entry = app::jobs_entrypoint();

    let response = entry.handle(request(Method::POST, "/api/inngest")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({"error": "missing fnId"}));

    let response = entry.handle(request(Method::POST, "/api/inngest?fnId=nope")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({"error": "function not found: nope"}));

    let response = entry
        .handle(
            Request::builder()
                .method(Method::POST)
                .uri("/api/inngest?fnId=example-cron")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = entry.handle(request(Method::DELETE, "/api/inngest")).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body_json(response).await, json!({"error": "method not allowed"}));
}

/// Dispatched directly, without a router; panics on `/boom`.
#[derive(Clone)]
struct Volatile;

#[async_trait]
impl Dispatch for Volatile {
    async fn dispatch(self, request: Request<Body>) -> Response {
        if request.uri().path() == "/boom" {
            panic!("volatile endpoint exploded");
        }
        render::json(StatusCode::OK, json!({"ok": true}))
    }
}

#[tokio::test]
async fn test_direct_dispatch_panic_becomes_500() {
    let entry = Entrypoint::<Volatile>::new("volatile", || Container::new().supply(Volatile));

    let response = entry.handle(get("/boom")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, json!({"error": "internal server error"}));

    let response = entry.handle(get("/calm")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"ok": true}));
}

#[tokio::test]
async fn test_concurrent_requests_get_independent_roots() {
    let entry = app::health_entrypoint();
    let requests = (0..8).map(|_| {
        let entry = entry.clone();
        tokio::spawn(async move { entry.handle(get("/health")).await.status() })
    });

    for handle in requests.collect::<Vec<_>>() {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_local_run_mode() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(app::serve(listener, async move {
        let _ = stopped.await;
    }));

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    let health: serde_json::Value = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health, json!({"ok": true}));

    let jobs = client
        .get(format!("http://{addr}/api/inngest"))
        .send()
        .await
        .unwrap();
    assert_eq!(jobs.status(), reqwest::StatusCode::OK);
    let jobs: serde_json::Value = jobs.json().await.unwrap();
    assert_eq!(jobs["functions"][0]["id"], "example-cron");

    let ping = client
        .get(format!("http://{addr}/ping"))
        .send()
        .await
        .unwrap();
    assert_eq!(ping.status(), reqwest::StatusCode::OK);

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();
}
