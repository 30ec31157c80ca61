//! Feed Client Integration Tests
//!
//! Runs the Yakker client against an in-process WebSocket server.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_util::sync::CancellationToken;
use yakker_stream::infrastructure::yakker::{HeartbeatConfig, ReconnectConfig};
use yakker_stream::{
    ConnectionState, FeedClientConfig, FeedState, IngestPipeline, Metric, MetricAggregator,
    YakkerClient,
};

/// What the server does on one accepted connection.
struct Session {
    frames: Vec<Message>,
    close_after: bool,
}

struct TestServer {
    url: String,
    auth_headers: Arc<Mutex<Vec<Option<String>>>>,
    handle: JoinHandle<()>,
}

async fn start_server(sessions: Vec<Session>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let auth_headers = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&auth_headers);

    let handle = tokio::spawn(async move {
        for session in sessions {
            let (stream, _) = listener.accept().await.unwrap();
            let seen = Arc::clone(&seen);
            let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                let auth = req
                    .headers()
                    .get("authorization")
                    .map(|v| v.to_str().unwrap().to_string());
                seen.lock().push(auth);
                Ok(resp)
            };
            let mut ws = tokio_tungstenite::accept_hdr_async(stream, callback)
                .await
                .unwrap();

            for frame in session.frames {
                ws.send(frame).await.unwrap();
            }

            if session.close_after {
                let _ = ws.send(Message::Close(None)).await;
                let _ = tokio::time::timeout(Duration::from_millis(200), ws.next()).await;
            } else {
                while let Some(Ok(_)) = ws.next().await {}
            }
        }
    });

    TestServer {
        url: format!("ws://{addr}"),
        auth_headers,
        handle,
    }
}

fn payload(event: &str, zone_speed: f64) -> Message {
    Message::text(
        json!({
            "event_uuid": event,
            "pitch_data": {"ZoneSpeedMPH": zone_speed}
        })
        .to_string(),
    )
}

struct Harness {
    aggregator: Arc<MetricAggregator>,
    feed_state: Arc<FeedState>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

fn start_client(url: &str, auth: Option<&str>) -> Harness {
    start_client_with(url, auth, HeartbeatConfig::default())
}

fn start_client_with(url: &str, auth: Option<&str>, heartbeat: HeartbeatConfig) -> Harness {
    let aggregator = Arc::new(MetricAggregator::default());
    let feed_state = Arc::new(FeedState::new());
    let cancel = CancellationToken::new();

    let mut config = FeedClientConfig::new(url, auth.map(str::to_string));
    config.reconnect = ReconnectConfig::new(Duration::from_millis(50));
    config.heartbeat = heartbeat;

    let client = Arc::new(YakkerClient::new(
        config,
        Arc::new(IngestPipeline::new(Arc::clone(&aggregator))),
        Arc::clone(&feed_state),
        cancel.clone(),
    ));
    let task = tokio::spawn(client.run());

    Harness {
        aggregator,
        feed_state,
        cancel,
        task,
    }
}

async fn wait_for(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn malformed_frame_does_not_drop_connection() {
    let server = start_server(vec![Session {
        frames: vec![
            Message::text("{not json"),
            Message::text("[1, 2]"),
            payload("demo-001", 44.7),
        ],
        close_after: false,
    }])
    .await;
    let harness = start_client(&server.url, None);

    wait_for(|| harness.aggregator.bucket("demo-001").is_some()).await;

    assert_eq!(harness.feed_state.state(), ConnectionState::Connected);
    assert_eq!(harness.feed_state.messages_received(), 3);
    assert_eq!(harness.feed_state.malformed_messages(), 2);
    assert_eq!(
        harness
            .aggregator
            .bucket("demo-001")
            .unwrap()
            .get(Metric::PitchVelocity),
        Some(44.7)
    );

    harness.cancel.cancel();
    tokio::time::timeout(Duration::from_secs(1), harness.task)
        .await
        .unwrap()
        .unwrap();
    server.handle.abort();
}

#[tokio::test]
async fn reconnects_after_server_close() {
    let server = start_server(vec![
        Session {
            frames: vec![payload("demo-001", 44.7)],
            close_after: true,
        },
        Session {
            frames: vec![payload("demo-002", 45.8)],
            close_after: false,
        },
    ])
    .await;
    let harness = start_client(&server.url, Some("Basic dGVzdDp0ZXN0"));

    wait_for(|| harness.aggregator.bucket("demo-002").is_some()).await;

    assert!(harness.aggregator.bucket("demo-001").is_some());
    assert_eq!(harness.feed_state.state(), ConnectionState::Connected);
    assert_eq!(harness.feed_state.reconnect_attempts(), 0);
    assert!(harness.feed_state.last_connected_at().is_some());

    let headers = server.auth_headers.lock().clone();
    assert_eq!(headers.len(), 2);
    assert!(
        headers
            .iter()
            .all(|h| h.as_deref() == Some("Basic dGVzdDp0ZXN0"))
    );

    harness.cancel.cancel();
    tokio::time::timeout(Duration::from_secs(1), harness.task)
        .await
        .unwrap()
        .unwrap();
    server.handle.abort();
}

#[tokio::test]
async fn unreachable_server_keeps_retrying() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    drop(listener);

    let harness = start_client(&url, None);

    wait_for(|| harness.feed_state.reconnect_attempts() >= 2).await;
    assert!(harness.feed_state.last_error().is_some());
    assert!(harness.feed_state.last_connected_at().is_none());

    harness.cancel.cancel();
    tokio::time::timeout(Duration::from_secs(1), harness.task)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn cancellation_stops_idle_connection() {
    let server = start_server(vec![Session {
        frames: Vec::new(),
        close_after: false,
    }])
    .await;
    let harness = start_client(&server.url, None);

    wait_for(|| harness.feed_state.state() == ConnectionState::Connected).await;

    harness.cancel.cancel();
    tokio::time::timeout(Duration::from_secs(1), harness.task)
        .await
        .unwrap()
        .unwrap();
    server.handle.abort();
}

#[tokio::test]
async fn zero_heartbeat_interval_keeps_connection_alive() {
    let server = start_server(vec![Session {
        frames: vec![payload("demo-001", 44.7)],
        close_after: false,
    }])
    .await;
    let harness = start_client_with(
        &server.url,
        None,
        HeartbeatConfig::new(Duration::ZERO, Duration::ZERO),
    );

    wait_for(|| harness.aggregator.bucket("demo-001").is_some()).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(harness.feed_state.state(), ConnectionState::Connected);
    assert_eq!(harness.feed_state.reconnect_attempts(), 0);
    assert!(!harness.task.is_finished());

    harness.cancel.cancel();
    tokio::time::timeout(Duration::from_secs(1), harness.task)
        .await
        .unwrap()
        .unwrap();
    server.handle.abort();
}
