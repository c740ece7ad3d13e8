//! Integration tests for the push feed against a local WebSocket server.
//!
//! These run in real time with short backoffs and bounded waits.
//!
//! Run with: `cargo test --test push_feed_integration`

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use railview::model::Snapshot;
use railview::sync::{PushFeed, SyncClient, SyncConfig};

use common::ScriptedTransport;

// ============================================================================
// Test server
// ============================================================================

struct PushServer {
    url: String,
    connections: Arc<AtomicUsize>,
}

/// Serve each connection the given ticks, then either close or hold it open.
async fn push_server(ticks: Vec<u64>, close_after_send: bool) -> PushServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/ws", listener.local_addr().unwrap());
    let connections = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&connections);
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            let ticks = ticks.clone();
            tokio::spawn(async move {
                let Ok(mut socket) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                for tick in ticks {
                    let body = serde_json::to_string(&Snapshot::at_tick(tick)).unwrap();
                    if socket.send(Message::text(body)).await.is_err() {
                        return;
                    }
                }
                if close_after_send {
                    let _ = socket.close(None).await;
                } else {
                    while let Some(Ok(_)) = socket.next().await {}
                }
            });
        }
    });

    PushServer { url, connections }
}

fn push_client(transport: &Arc<ScriptedTransport>, url: &str) -> SyncClient {
    SyncClient::new(
        Arc::clone(transport) as _,
        Arc::new(PushFeed::new(url, Duration::from_millis(100))),
        SyncConfig::default(),
    )
}

async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_pushed_snapshots_pass_tick_guard() {
    let server = push_server(vec![3, 2], false).await;
    let transport = Arc::new(ScriptedTransport::new());
    let client = push_client(&transport, &server.url);

    assert!(client.start());

    assert!(wait_until(|| client.stats().stale_discarded == 1).await);
    assert_eq!(client.snapshot().unwrap().tick_number, 3);
    // Seeded once from the state endpoint before connecting.
    assert_eq!(transport.call_count(), 1);

    client.shutdown().await;
}

#[tokio::test]
async fn test_reconnects_after_server_close() {
    let server = push_server(vec![5], true).await;
    let transport = Arc::new(ScriptedTransport::new());
    let client = push_client(&transport, &server.url);

    client.start();
    assert!(wait_until(|| server.connections.load(Ordering::SeqCst) >= 2).await);
    assert_eq!(client.snapshot().unwrap().tick_number, 5);

    client.stop();
    tokio::time::sleep(Duration::from_millis(300)).await;
    let after_stop = server.connections.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(server.connections.load(Ordering::SeqCst), after_stop);
    assert!(client.error().is_none());

    client.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_push_server_records_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/ws", listener.local_addr().unwrap());
    drop(listener);

    let transport = Arc::new(ScriptedTransport::new());
    let client = push_client(&transport, &url);
    client.start();

    assert!(wait_until(|| client.error().is_some()).await);
    // The seeded snapshot survives the failed connection.
    assert_eq!(client.snapshot().unwrap().tick_number, 1);

    client.shutdown().await;
}
