//! Integration tests for the Sync Client.
//!
//! These tests verify request discipline against a scripted transport:
//! - supersession of in-flight requests
//! - the tick-order guard
//! - error retention and timeouts
//! - cadence lifecycle, pause and reset
//!
//! Run with: `cargo test --test sync_client_integration`

mod common;

use std::sync::Arc;
use std::time::Duration;

use railview::sync::{
    FetchOutcome, FetchRequest, ManualFeed, PollingFeed, SyncClient, SyncConfig, SyncError,
};

use common::ScriptedTransport;

// ============================================================================
// Helper Functions
// ============================================================================

fn manual_client(transport: &Arc<ScriptedTransport>) -> SyncClient {
    SyncClient::new(
        Arc::clone(transport) as _,
        Arc::new(ManualFeed),
        SyncConfig::default(),
    )
}

fn polling_client(transport: &Arc<ScriptedTransport>) -> SyncClient {
    let config = SyncConfig::default();
    SyncClient::new(
        Arc::clone(transport) as _,
        Arc::new(PollingFeed::new(config.tick_interval)),
        config,
    )
}

// ============================================================================
// Request discipline
// ============================================================================

/// Two rapid steps: only the later one is applied.
#[tokio::test(start_paused = true)]
async fn test_rapid_steps_apply_only_latest() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_tick(1, Duration::from_millis(500));
    transport.push_tick(2, Duration::from_millis(100));
    let client = manual_client(&transport);

    let (first, second) = tokio::join!(client.step(), client.step());

    assert_eq!(first, Ok(FetchOutcome::Superseded));
    assert_eq!(second, Ok(FetchOutcome::Applied(2)));
    assert_eq!(client.snapshot().unwrap().tick_number, 2);

    let stats = client.stats();
    assert_eq!(stats.applied, 1);
    assert_eq!(stats.superseded, 1);
    assert!(client.error().is_none());
}

/// A slow earlier response can never land after a faster later one.
#[tokio::test(start_paused = true)]
async fn test_superseded_response_never_published() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_tick(10, Duration::from_millis(50));
    transport.push_tick(9, Duration::from_millis(10));
    let client = manual_client(&transport);
    let mut updates = client.subscribe();

    let (first, second) = tokio::join!(client.step(), client.step());
    assert_eq!(first, Ok(FetchOutcome::Superseded));
    assert_eq!(second, Ok(FetchOutcome::Applied(9)));

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(updates.has_changed().unwrap());
    let published = updates.borrow_and_update().clone();
    assert_eq!(published.snapshot.unwrap().tick_number, 9);
}

#[tokio::test]
async fn test_lower_tick_is_discarded() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_tick(5, Duration::ZERO);
    transport.push_tick(3, Duration::ZERO);
    let client = manual_client(&transport);

    assert_eq!(client.step().await, Ok(FetchOutcome::Applied(5)));
    assert_eq!(
        client.step().await,
        Ok(FetchOutcome::Stale {
            tick: 3,
            last_applied: 5
        })
    );
    assert_eq!(client.snapshot().unwrap().tick_number, 5);
    assert_eq!(client.stats().stale_discarded, 1);
}

#[tokio::test]
async fn test_equal_tick_is_noop() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_tick(4, Duration::ZERO);
    transport.push_tick(4, Duration::ZERO);
    let client = manual_client(&transport);
    let mut updates = client.subscribe();

    client.refresh().await.unwrap();
    updates.borrow_and_update();

    assert!(matches!(
        client.refresh().await,
        Ok(FetchOutcome::Stale { .. })
    ));
    assert!(!updates.has_changed().unwrap());
}

// ============================================================================
// Errors
// ============================================================================

#[tokio::test]
async fn test_error_keeps_last_good_snapshot() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_tick(1, Duration::ZERO);
    transport.push_failure(
        SyncError::Status {
            status: 502,
            url: "scripted://simulation/tick".to_string(),
        },
        Duration::ZERO,
    );
    transport.push_tick(2, Duration::ZERO);
    let client = manual_client(&transport);

    client.step().await.unwrap();
    assert!(client.step().await.is_err());
    assert_eq!(client.snapshot().unwrap().tick_number, 1);
    assert!(matches!(
        client.error(),
        Some(SyncError::Status { status: 502, .. })
    ));

    // Next success clears the error.
    client.step().await.unwrap();
    assert!(client.error().is_none());
    assert_eq!(client.stats().failures, 1);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_does_not_block_next_fetch() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_tick(1, Duration::from_secs(30));
    transport.push_tick(2, Duration::ZERO);
    let client = manual_client(&transport);

    assert!(matches!(client.step().await, Err(SyncError::Timeout(_))));
    assert_eq!(client.step().await, Ok(FetchOutcome::Applied(2)));
    assert!(client.error().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_stop_aborts_in_flight_request() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_tick(1, Duration::from_secs(1));
    let client = manual_client(&transport);

    let pending = tokio::spawn({
        let client = client.clone();
        async move { client.step().await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    client.stop();

    assert_eq!(pending.await.unwrap(), Err(SyncError::Cancelled));
    assert!(client.snapshot().is_none());
    assert!(client.error().is_none(), "cancellation is not an error");
}

#[tokio::test]
async fn test_multi_step_is_capped() {
    let transport = Arc::new(ScriptedTransport::new());
    let client = manual_client(&transport);

    client.multi_step(250).await.unwrap();
    client.multi_step(7).await.unwrap();
    assert_eq!(
        transport.calls(),
        vec![FetchRequest::MultiTick(100), FetchRequest::MultiTick(7)]
    );
    assert!(matches!(
        client.multi_step(0).await,
        Err(SyncError::InvalidArgument(_))
    ));
}

// ============================================================================
// Cadence
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_start_twice_creates_one_timer() {
    let transport = Arc::new(ScriptedTransport::new());
    let client = polling_client(&transport);

    assert!(client.start());
    assert!(!client.start());

    // Immediate fetch, then one every 1.5 s.
    tokio::time::sleep(Duration::from_millis(3100)).await;
    assert_eq!(transport.call_count(), 3);
    assert_eq!(client.snapshot().unwrap().tick_number, 3);

    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_cadence() {
    let transport = Arc::new(ScriptedTransport::new());
    let client = polling_client(&transport);

    client.start();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(client.stop());
    assert!(!client.stop());
    assert!(!client.is_running());

    let calls = transport.call_count();
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(transport.call_count(), calls);

    // Can be started again after a plain stop.
    assert!(client.start());
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(transport.call_count(), calls + 1);
    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_pause_suspends_cadence() {
    let transport = Arc::new(ScriptedTransport::new());
    let client = polling_client(&transport);
    let cadence = client.cadence();

    client.start();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(transport.call_count(), 1);

    cadence.pause();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(transport.call_count(), 1);
    assert!(client.is_running());

    cadence.resume();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(transport.call_count(), 2);

    // Manual steps are not subject to the cadence.
    cadence.pause();
    client.step().await.unwrap();
    assert_eq!(transport.call_count(), 3);

    client.shutdown().await;
}

// ============================================================================
// Reset
// ============================================================================

#[tokio::test]
async fn test_reset_reseeds_from_state() {
    let transport = Arc::new(ScriptedTransport::new());
    let client = manual_client(&transport);

    client.step().await.unwrap();
    client.step().await.unwrap();
    assert_eq!(client.snapshot().unwrap().tick_number, 2);

    assert_eq!(client.reset().await, Ok(FetchOutcome::Applied(0)));
    assert_eq!(transport.restarts(), 1);
    assert_eq!(transport.calls().last(), Some(&FetchRequest::State));
    assert_eq!(client.epoch(), 1);
    assert_eq!(client.snapshot().unwrap().tick_number, 0);

    // The tick guard restarted with the run.
    assert_eq!(client.step().await, Ok(FetchOutcome::Applied(1)));
}

/// A step issued while the server restarts waits for the new run instead
/// of cancelling the reset.
#[tokio::test(start_paused = true)]
async fn test_step_during_slow_restart_waits_for_new_run() {
    let transport = Arc::new(ScriptedTransport::new());
    let client = manual_client(&transport);
    for _ in 0..5 {
        client.step().await.unwrap();
    }
    assert_eq!(client.snapshot().unwrap().tick_number, 5);

    transport.set_restart_delay(Duration::from_millis(200));
    let (reset, step) = tokio::join!(client.reset(), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        client.step().await
    });

    assert_eq!(reset, Ok(FetchOutcome::Applied(0)));
    assert_eq!(step, Ok(FetchOutcome::Applied(1)));
    assert_eq!(client.epoch(), 1);
    assert_eq!(client.snapshot().unwrap().tick_number, 1);
    assert_eq!(client.step().await, Ok(FetchOutcome::Applied(2)));
}

/// A step already in flight when the reset begins belongs to the old run.
#[tokio::test(start_paused = true)]
async fn test_reset_supersedes_in_flight_step() {
    let transport = Arc::new(ScriptedTransport::new());
    let client = manual_client(&transport);
    client.step().await.unwrap();

    transport.push_tick(9, Duration::from_millis(500));
    let (step, reset) = tokio::join!(client.step(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        client.reset().await
    });

    assert_eq!(step, Ok(FetchOutcome::Superseded));
    assert_eq!(reset, Ok(FetchOutcome::Applied(0)));
    assert_eq!(client.snapshot().unwrap().tick_number, 0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_does_not_abort_restart() {
    let transport = Arc::new(ScriptedTransport::new());
    let client = manual_client(&transport);
    client.step().await.unwrap();

    transport.set_restart_delay(Duration::from_millis(200));
    let (reset, _) = tokio::join!(client.reset(), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        client.stop()
    });

    assert_eq!(reset, Ok(FetchOutcome::Applied(0)));
    assert_eq!(client.epoch(), 1);
}

#[tokio::test]
async fn test_refused_reset_changes_nothing() {
    let transport = Arc::new(ScriptedTransport::new());
    let client = manual_client(&transport);
    client.step().await.unwrap();

    transport.fail_restart(true);
    assert!(matches!(
        client.reset().await,
        Err(SyncError::Status { status: 503, .. })
    ));
    assert_eq!(client.epoch(), 0);
    assert_eq!(client.snapshot().unwrap().tick_number, 1);
    assert!(client.error().is_some());
}

#[tokio::test]
async fn test_failed_reseed_leaves_empty_snapshot() {
    let transport = Arc::new(ScriptedTransport::new());
    let client = manual_client(&transport);
    client.step().await.unwrap();

    transport.push_failure(SyncError::Transport("connection reset".to_string()), Duration::ZERO);
    assert!(client.reset().await.is_err());
    assert_eq!(client.epoch(), 1);
    assert!(client.snapshot().is_none());
    assert!(client.error().is_some());
}
