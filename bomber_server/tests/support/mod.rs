// Shared primitives for one-time server bootstrapping across integration tests.
#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Message, protocol::CloseFrame},
};

// Global base URL used by all tests after the server publishes its bound address.
static SERVER_URL: OnceLock<String> = OnceLock::new();
// One-time guard that ensures the server bootstrap path runs only once.
static SERVER_READY: OnceLock<()> = OnceLock::new();

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

// Ensure the test server is running and return the shared base URL.
pub fn ensure_server() -> &'static str {
    SERVER_READY.get_or_init(|| {
        let published_url = Arc::new(OnceLock::<String>::new());
        let published_url_thread = Arc::clone(&published_url);
        // The server gets its own OS thread and runtime so it outlives each
        // `#[tokio::test]` runtime.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                // Ephemeral port avoids collisions with local services.
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_url_thread.set(format!("http://{}", addr));
                bomber_server::run(listener).await.expect("server failed");
            });
        });
        wait_for_server_url_and_readiness(published_url);
    });

    SERVER_URL
        .get()
        .expect("server url should be initialized")
        .as_str()
}

fn wait_for_server_url_and_readiness(published_url: Arc<OnceLock<String>>) {
    let base_url = loop {
        if let Some(url) = published_url.get() {
            break url.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    let _ = SERVER_URL.set(base_url.clone());

    let addr = base_url
        .strip_prefix("http://")
        .expect("base url should use http://");

    // Retry for a short period to avoid racing server bind/accept.
    for _ in 0..100 {
        if std::net::TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("server did not become ready in time");
}

pub fn ws_url(base_url: &str, session_id: &str) -> String {
    let host = base_url
        .strip_prefix("http://")
        .expect("base url should use http://");
    format!("ws://{host}/ws?session_id={session_id}")
}

// Create a session over the internal HTTP route with an all-open map.
pub async fn create_session(
    base_url: &str,
    session_id: &str,
    spawn_points: &[(i32, i32)],
    width: u32,
    height: u32,
) {
    let payload = serde_json::json!({
        "session_id": session_id,
        "spawn_points": spawn_points
            .iter()
            .map(|(x, y)| serde_json::json!({ "x": x, "y": y }))
            .collect::<Vec<_>>(),
        "map": {
            "width": width,
            "height": height,
            "tiles": vec![0u8; (width * height) as usize],
        },
    });

    let res = reqwest::Client::new()
        .post(format!("{base_url}/sessions"))
        .json(&payload)
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);
}

pub async fn connect(base_url: &str, session_id: &str) -> Client {
    let (ws, _response) = connect_async(ws_url(base_url, session_id))
        .await
        .expect("websocket handshake should succeed");
    ws
}

pub async fn send_json(ws: &mut Client, msg: Value) {
    ws.send(Message::text(msg.to_string()))
        .await
        .expect("send should succeed");
}

// Next server message whose type is not a periodic position broadcast.
pub async fn next_message(ws: &mut Client) -> Value {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let msg = ws
                .next()
                .await
                .expect("socket should stay open")
                .expect("frame should be readable");
            let Message::Text(text) = msg else {
                continue;
            };
            let value: Value = serde_json::from_str(text.as_str()).expect("server sends json");
            let periodic = value["type"] == "MovePlayer" && value["data"].get("timestamp").is_some();
            if !periodic {
                return value;
            }
        }
    })
    .await
    .expect("timed out waiting for a server message")
}

// Join and return the assigned player id.
pub async fn join(ws: &mut Client) -> String {
    send_json(ws, serde_json::json!({ "type": "NewPlayer" })).await;
    loop {
        let msg = next_message(ws).await;
        if msg["type"] == "AssignId" {
            return msg["data"]["id"]
                .as_str()
                .expect("id is a string")
                .to_string();
        }
    }
}

// Reads until the server's close frame, skipping any game traffic before it.
pub async fn next_close(ws: &mut Client) -> CloseFrame {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let msg = ws
                .next()
                .await
                .expect("socket should deliver a close frame")
                .expect("frame should be readable");
            if let Message::Close(frame) = msg {
                return frame.expect("close frame should carry a code");
            }
        }
    })
    .await
    .expect("timed out waiting for close frame")
}
