//! Query API tests: router-level and over a real socket
//!
//! Router tests call the axum service directly. The server tests bind an
//! ephemeral port and query it with an HTTP client, the way an external
//! harness would once the service is up.

use std::{net::SocketAddr, time::Duration};

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tower::ServiceExt;

use sensorum::{
    Config, SensorRegistry, Server, api,
    test_utils::{channel_transport, sample_measurement},
};

async fn get(registry: &SensorRegistry, path: &str) -> (StatusCode, String, Value) {
    let response = api::router(registry.clone())
        .oneshot(Request::get(path).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    (status, content_type, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_fresh_registry_is_empty() {
    let registry = SensorRegistry::default();

    let (status, content_type, body) = get(&registry, "/sensors/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "application/json");
    assert_eq!(body, json!([]));

    let (status, _, body) = get(&registry, "/sensors/next/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("sensor0"));
}

#[tokio::test]
async fn test_next_sensor_is_read_only() {
    let registry = SensorRegistry::default();

    let (_, _, first) = get(&registry, "/sensors/next/").await;
    let (_, _, second) = get(&registry, "/sensors/next/").await;
    assert_eq!(first, json!("sensor0"));
    assert_eq!(second, json!("sensor0"));
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_list_follows_index_order() {
    let registry = SensorRegistry::default();
    for name in ["sensor0", "sensor1", "garden"] {
        registry.register_or_get(name);
    }

    let (_, _, body) = get(&registry, "/sensors/").await;
    assert_eq!(body, json!(["sensor0", "sensor1", "garden"]));

    let (_, _, body) = get(&registry, "/sensors/next/").await;
    assert_eq!(body, json!("sensor3"));
}

#[tokio::test]
async fn test_wrong_method_is_client_error() {
    let response = api::router(SensorRegistry::default())
        .oneshot(
            Request::post("/sensors/")
                .body(Body::from("[]"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

/// Issue one GET against a running server, returning status and JSON body.
async fn http_get(addr: SocketAddr, path: &str) -> (reqwest::StatusCode, Value) {
    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .build()
        .unwrap();
    let response = client
        .get(format!("http://{addr}{path}"))
        .send()
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    assert_eq!(content_type, "application/json", "{path}");

    (status, response.json().await.unwrap())
}

fn ephemeral_config() -> Config {
    Config {
        http_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_server_serves_and_ingests() {
    let registry = SensorRegistry::default();
    let (transport, handle) = channel_transport();
    let server = Server::bind_with_transport(ephemeral_config(), registry.clone(), transport)
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let running = tokio::spawn(server.run(async {
        let _ = stop_rx.await;
    }));

    let (status, body) = http_get(addr, "/sensors/").await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(body, json!([]));

    let (_, body) = http_get(addr, "/sensors/next/").await;
    assert_eq!(body, json!("sensor0"));

    handle.connect();
    handle.publish_measurement("sensors/sensor0", &sample_measurement(7.0));

    // Ingestion runs on its own task; wait for it to land.
    tokio::time::timeout(Duration::from_secs(5), async {
        while registry.is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("measurement was not ingested");

    let (_, body) = http_get(addr, "/sensors/").await;
    assert_eq!(body, json!(["sensor0"]));
    let (_, body) = http_get(addr, "/sensors/next/").await;
    assert_eq!(body, json!("sensor1"));

    let (status, body) = http_get(addr, "/nowhere").await;
    assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    assert_eq!(handle.subscriptions(), vec!["sensors/+"]);

    stop_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("server did not shut down")
        .unwrap()
        .unwrap();

    // The socket is released on shutdown
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_binding() {
    let mut config = ephemeral_config();
    config.mqtt.topic_root = "#".to_string();

    let (transport, _handle) = channel_transport();
    let result = Server::bind_with_transport(config, SensorRegistry::default(), transport).await;
    assert!(matches!(result, Err(sensorum::Error::Config { .. })));
}
