use super::*;
use crate::dispatch::{ChunkReceiver, chunk_queue};
use crate::types::Chunk;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use std::time::Duration;
use tower::ServiceExt;


const BOUNDARY: &str = "----WebKitFormBoundary7MA4YWxkTrZu0gW";

/// Router over the given config plus the receiving end of its chunk queue
fn test_app(config: Config) -> (Router, ChunkReceiver) {
    let config = Arc::new(config);
    let (chunks, receiver) = chunk_queue(&config.queue);
    (create_router(config, chunks), receiver)
}

/// Build a multipart body from text fields and an optional file part
fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"{name}\"\r\n\
                 \r\n\
                 {value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((name, filename, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\
                 \r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

/// Chunk waiting in the queue, if any, without blocking
fn queued(receiver: &mut ChunkReceiver) -> Option<Chunk> {
    receiver.try_recv().ok()
}

#[tokio::test]
async fn test_api_server_spawns() {
    let mut config = Config::default();
    config.server.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port
    let config = Arc::new(config);
    let (chunks, _receiver) = chunk_queue(&config.queue);

    let api_handle = tokio::spawn(start_api_server(config, chunks));

    // Give it a moment to start
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!api_handle.is_finished(), "server should still be running");

    api_handle.abort();
}

#[tokio::test]
async fn test_serve_stops_on_shutdown_signal() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let config = Arc::new(Config::default());
    let (chunks, _receiver) = chunk_queue(&config.queue);
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    let handle = tokio::spawn(serve(listener, config, chunks, async move {
        stop_rx.await.ok();
    }));

    stop_tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("server should stop after shutdown signal")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cors_enabled() {
    let mut config = Config::default();
    config.server.cors_enabled = true;
    config.server.cors_origins = vec!["*".to_string()];
    let (app, _receiver) = test_app(config);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_specific_origin() {
    let mut config = Config::default();
    config.server.cors_origins = vec!["http://uploads.example.com".to_string()];
    let (app, _receiver) = test_app(config);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://uploads.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "http://uploads.example.com"
    );

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://evil.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_cors_preflight_allows_upload_methods() {
    let (app, _receiver) = test_app(Config::default());

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/")
        .header("Origin", "http://localhost:3000")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "x-requested-with")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let methods = response
        .headers()
        .get("access-control-allow-methods")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(methods.contains("POST"));
    assert!(methods.contains("GET"));
    assert!(!methods.contains("PUT"));
}

#[tokio::test]
async fn test_cors_disabled() {
    let mut config = Config::default();
    config.server.cors_enabled = false;
    let (app, _receiver) = test_app(config);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be absent when CORS is disabled"
    );
}
