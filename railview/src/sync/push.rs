//! WebSocket push feed.
//!
//! The server pushes a full snapshot whenever it advances. The feed keeps a
//! connection open while the client is running and reconnects after a fixed
//! backoff when the channel closes.
//!
//! ```text
//! Seeding --[state fetched]--> Connecting
//! Connecting --[ok]--> Streaming --[closed / error]--> Backoff --[elapsed]--> Connecting
//! Connecting --[error]--> Backoff
//! any --[stop()]--> Stopped        (no reconnect)
//! ```

use std::time::Duration;

use futures_util::StreamExt;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::client::ApplyOutcome;
use super::error::SyncError;
use super::feed::{log_feed_outcome, FeedContext, UpdateFeed};
use super::transport::{BoxFuture, FetchRequest};
use crate::model::Snapshot;

type Socket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Server-driven feed over a WebSocket.
///
/// Pause requests do not stop delivery: in push mode the server owns the
/// clock, and the frozen alert view is held by the aggregator.
#[derive(Debug, Clone)]
pub struct PushFeed {
    url: String,
    backoff: Duration,
}

impl PushFeed {
    pub fn new(url: impl Into<String>, backoff: Duration) -> Self {
        Self {
            url: url.into(),
            backoff,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn run_loop(&self, ctx: FeedContext) {
        let shutdown = ctx.shutdown_token();

        // Seed the snapshot; pushes only arrive when the server advances.
        let seeded = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return,
            result = ctx.fetch(FetchRequest::State) => result,
        };
        log_feed_outcome(self.name(), &seeded);

        while ctx.should_connect() {
            let connected = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                result = connect_async(self.url.as_str()) => result,
            };

            match connected {
                Ok((socket, _response)) => {
                    info!(url = %self.url, "Push channel connected");
                    if let Err(e) = self.stream(socket, &ctx, &shutdown).await {
                        warn!(url = %self.url, error = %e, "Push channel failed");
                        ctx.record_error(e);
                    }
                }
                Err(e) => {
                    warn!(url = %self.url, error = %e, "Push channel connect failed");
                    ctx.record_error(SyncError::from(e));
                }
            }

            if !ctx.should_connect() {
                break;
            }
            debug!(backoff_secs = self.backoff.as_secs_f64(), "Reconnecting push channel after backoff");
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.backoff) => {}
            }
        }

        info!("Push feed stopped");
    }

    /// Pump messages until the channel closes or the client stops.
    async fn stream(
        &self,
        mut socket: Socket,
        ctx: &FeedContext,
        shutdown: &CancellationToken,
    ) -> Result<(), SyncError> {
        loop {
            let message = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    let _ = socket.close(None).await;
                    return Ok(());
                }
                message = socket.next() => message,
            };

            match message {
                None => {
                    info!(url = %self.url, "Push channel closed by server");
                    return Ok(());
                }
                Some(Err(e)) => return Err(SyncError::from(e)),
                Some(Ok(Message::Text(text))) => self.deliver(text.as_bytes(), ctx),
                Some(Ok(Message::Binary(bytes))) => self.deliver(&bytes, ctx),
                Some(Ok(Message::Close(frame))) => {
                    info!(url = %self.url, frame = ?frame, "Push channel close frame");
                    return Ok(());
                }
                Some(Ok(_)) => {}
            }
        }
    }

    fn deliver(&self, bytes: &[u8], ctx: &FeedContext) {
        match Snapshot::from_slice(bytes) {
            Ok(snapshot) => {
                let tick = snapshot.tick_number;
                match ctx.apply(snapshot) {
                    ApplyOutcome::Applied => debug!(tick, "Applied pushed snapshot"),
                    ApplyOutcome::Stale { last_applied } => {
                        debug!(tick, last_applied, "Discarded stale pushed snapshot")
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Undecodable push message");
                ctx.record_error(SyncError::Decode(e.to_string()));
            }
        }
    }
}

impl UpdateFeed for PushFeed {
    fn run(&self, ctx: FeedContext) -> BoxFuture<'_, ()> {
        Box::pin(self.run_loop(ctx))
    }

    fn name(&self) -> &'static str {
        "push"
    }
}
