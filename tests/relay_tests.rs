use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use chatbox::server::{
    create_router, ConnectionManager, FrameHandler, InMemoryConnectionManager,
    RelayMessageHandler,
};
use chatbox::AppState;
use futures::{future::join_all, SinkExt, StreamExt};
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tower::ServiceExt;
use uuid::Uuid;

mod utils;

use utils::*;

const WAIT: Duration = Duration::from_secs(2);

/// Serves a relay on an ephemeral port and returns its address
async fn spawn_relay(
    manager: Arc<InMemoryConnectionManager>,
    max_connections: usize,
) -> SocketAddr {
    let app_state = AppState::new(manager, max_connections);
    let router = create_router(app_state, &std::env::temp_dir());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn wait_for_connections(manager: &InMemoryConnectionManager, expected: usize) {
    timeout(WAIT, async {
        while manager.connection_count().await != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("relay did not register connections in time");
}

fn static_dir_with_index() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("chatbox-static-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), "<h1>chatbox</h1>").unwrap();
    std::fs::write(dir.join("style.css"), "body { margin: 0; }").unwrap();
    dir
}

#[tokio::test]
async fn test_relay_broadcasts_to_everyone_but_sender() {
    let manager = MockConnectionManager::new();
    for id in ["a", "b", "c"] {
        manager.add_connected(id).await;
    }
    let handler = RelayMessageHandler::new(Arc::new(manager.clone()));

    handler
        .handle_frame("a", r#"{"user":"alice","message":"hi"}"#.to_string())
        .await;

    let expected = vec![r#"{"user":"alice","message":"hi"}"#.to_string()];
    assert!(manager.get_messages_for("a").await.is_empty());
    assert_eq!(manager.get_messages_for("b").await, expected);
    assert_eq!(manager.get_messages_for("c").await, expected);
}

#[tokio::test]
async fn test_relay_drops_invalid_frames() {
    let manager = MockConnectionManager::new();
    manager.add_connected("a").await;
    manager.add_connected("b").await;
    let handler = RelayMessageHandler::new(Arc::new(manager.clone()));

    handler.handle_frame("a", "hello?".to_string()).await;
    handler
        .handle_frame("a", r#"{"message":"no user"}"#.to_string())
        .await;

    assert!(manager.get_messages_for("b").await.is_empty());
}

#[tokio::test]
async fn test_relay_strips_unknown_fields() {
    let manager = MockConnectionManager::new();
    manager.add_connected("a").await;
    manager.add_connected("b").await;
    let handler = RelayMessageHandler::new(Arc::new(manager.clone()));

    handler
        .handle_frame(
            "a",
            r#"{"user":"alice","message":"hi","admin":true}"#.to_string(),
        )
        .await;

    assert_eq!(
        manager.get_messages_for("b").await,
        vec![r#"{"user":"alice","message":"hi"}"#.to_string()]
    );
}

#[tokio::test]
async fn test_websocket_clients_exchange_messages() {
    let manager = Arc::new(InMemoryConnectionManager::new());
    let addr = spawn_relay(manager.clone(), 8).await;
    let url = format!("ws://{}/ws", addr);

    let (mut alice, _) = connect_async(url.as_str()).await.unwrap();
    let (mut bob, _) = connect_async(url.as_str()).await.unwrap();
    wait_for_connections(&manager, 2).await;

    alice
        .send(Message::Text(
            r#"{"user":"alice","message":"hello bob"}"#.to_string(),
        ))
        .await
        .unwrap();

    let received = timeout(WAIT, bob.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(
        received,
        Message::Text(r#"{"user":"alice","message":"hello bob"}"#.to_string())
    );

    // The sender never gets its own frame back
    assert!(timeout(Duration::from_millis(200), alice.next())
        .await
        .is_err());

    bob.close(None).await.unwrap();
    wait_for_connections(&manager, 1).await;
}

#[tokio::test]
async fn test_relay_rejects_connections_over_capacity() {
    let manager = Arc::new(InMemoryConnectionManager::new());
    let addr = spawn_relay(manager.clone(), 1).await;
    let url = format!("ws://{}/ws", addr);

    let (_first, _) = connect_async(url.as_str()).await.unwrap();
    wait_for_connections(&manager, 1).await;

    let second = connect_async(url.as_str()).await;

    match second {
        Err(tokio_tungstenite::tungstenite::Error::Http(response)) => {
            assert_eq!(response.status().as_u16(), 503);
        }
        Err(other) => panic!("unexpected handshake error: {:?}", other),
        Ok(_) => panic!("relay accepted a connection over capacity"),
    }
}

#[tokio::test]
async fn test_concurrent_handshakes_respect_capacity() {
    let manager = Arc::new(InMemoryConnectionManager::new());
    let addr = spawn_relay(manager.clone(), 1).await;
    let url = format!("ws://{}/ws", addr);

    let attempts = join_all((0..8).map(|_| connect_async(url.as_str()))).await;

    let accepted = attempts.iter().filter(|attempt| attempt.is_ok()).count();
    assert_eq!(accepted, 1);
    for attempt in &attempts {
        if let Err(e) = attempt {
            assert!(matches!(
                e,
                tokio_tungstenite::tungstenite::Error::Http(response)
                    if response.status().as_u16() == 503
            ));
        }
    }
}

#[tokio::test]
async fn test_slot_is_released_when_client_leaves() {
    let manager = Arc::new(InMemoryConnectionManager::new());
    let addr = spawn_relay(manager.clone(), 1).await;
    let url = format!("ws://{}/ws", addr);

    let (mut first, _) = connect_async(url.as_str()).await.unwrap();
    wait_for_connections(&manager, 1).await;
    first.close(None).await.unwrap();
    wait_for_connections(&manager, 0).await;

    let second = connect_async(url.as_str()).await;

    assert!(second.is_ok());
}

#[tokio::test]
async fn test_static_files_are_served() {
    let dir = static_dir_with_index();
    let app_state = AppState::new(Arc::new(InMemoryConnectionManager::new()), 8);
    let router = create_router(app_state, &dir);

    let response = router
        .clone()
        .oneshot(Request::builder().uri("/style.css").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"body { margin: 0; }");

    let response = router
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"<h1>chatbox</h1>");

    std::fs::remove_dir_all(dir).unwrap();
}

#[tokio::test]
async fn test_unknown_paths_fall_back_to_index() {
    let dir = static_dir_with_index();
    let app_state = AppState::new(Arc::new(InMemoryConnectionManager::new()), 8);
    let router = create_router(app_state, &dir);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/rooms/general")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"<h1>chatbox</h1>");

    std::fs::remove_dir_all(dir).unwrap();
}
