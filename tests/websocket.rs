//! WebSocket tests against a live server on a loopback port

use futures::{SinkExt, StreamExt};
use notecast::auth::CredentialHasher;
use notecast::server::{NotesServer, NotesServerConfig};
use notecast::storage::MemoryStore;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn next_frame(ws: &mut WsClient) -> Value {
    loop {
        let msg = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("socket closed")
            .expect("socket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn login(http: &reqwest::Client, base: &str) -> String {
    let status = http
        .post(format!("{}/register", base))
        .json(&json!({"username": "alice", "email": "a@x.com", "password": "pw1"}))
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(status, StatusCode::CREATED);

    let body: Value = http
        .post(format!("{}/login", base))
        .json(&json!({"email": "a@x.com", "password": "pw1"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_websocket_lifecycle() {
    let mut config = NotesServerConfig::new("127.0.0.1:0".parse().unwrap(), "ws-test-secret");
    config.hasher = CredentialHasher::new(8, 1).unwrap();
    let store = Arc::new(MemoryStore::new());
    let server = NotesServer::new(config, store.clone(), store).unwrap();
    let bus = server.bus();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let running = tokio::spawn(server.serve(listener, async move {
        let _ = stop_rx.await;
    }));

    let (mut ws, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();

    let hello = next_frame(&mut ws).await;
    assert_eq!(hello["event"], "connected");
    assert!(hello["data"]["connection_id"].is_string());
    assert_eq!(bus.subscriber_count(), 1);

    ws.send(Message::text(r#"{"type":"ping","seq":5}"#)).await.unwrap();
    let pong = next_frame(&mut ws).await;
    assert_eq!(pong, json!({"event": "pong", "data": {"seq": 5}}));

    ws.send(Message::text("hello?")).await.unwrap();
    let error = next_frame(&mut ws).await;
    assert_eq!(error["event"], "error");
    assert!(error["data"]["message"].is_string());

    let base = format!("http://{}", addr);
    let http = reqwest::Client::new();
    let token = login(&http, &base).await;
    let response = http
        .post(format!("{}/notes", base))
        .bearer_auth(&token)
        .json(&json!({"title": "t1", "content": "c1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();

    let event = next_frame(&mut ws).await;
    assert_eq!(event["event"], "note_created");
    assert_eq!(event["data"], created);

    ws.close(None).await.unwrap();
    drop(ws);

    let mut remaining = bus.subscriber_count();
    for _ in 0..100 {
        if remaining == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        remaining = bus.subscriber_count();
    }
    assert_eq!(remaining, 0);

    drop(http);
    let _ = stop_tx.send(());
    timeout(Duration::from_secs(5), running)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_every_socket_receives_the_event() {
    let mut config = NotesServerConfig::new("127.0.0.1:0".parse().unwrap(), "ws-test-secret");
    config.hasher = CredentialHasher::new(8, 1).unwrap();
    let store = Arc::new(MemoryStore::new());
    let server = NotesServer::new(config, store.clone(), store).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let running = tokio::spawn(server.serve(listener, async move {
        let _ = stop_rx.await;
    }));

    let mut sockets = Vec::new();
    for _ in 0..3 {
        let (mut ws, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
        assert_eq!(next_frame(&mut ws).await["event"], "connected");
        sockets.push(ws);
    }

    let base = format!("http://{}", addr);
    let http = reqwest::Client::new();
    let token = login(&http, &base).await;
    let status = http
        .post(format!("{}/notes", base))
        .bearer_auth(&token)
        .json(&json!({"title": "shared", "content": "x"}))
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(status, StatusCode::CREATED);

    for ws in sockets.iter_mut() {
        let event = next_frame(ws).await;
        assert_eq!(event["event"], "note_created");
        assert_eq!(event["data"]["title"], "shared");
    }

    drop(sockets);
    drop(http);
    let _ = stop_tx.send(());
    let _ = timeout(Duration::from_secs(5), running).await;
}
