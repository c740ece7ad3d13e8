//! HTTP transport using reqwest.

use std::time::Duration;

use tracing::debug;

use super::error::SyncError;
use super::transport::{BoxFuture, FetchRequest, SnapshotTransport};
use crate::model::Snapshot;

/// Real transport against the simulation server's REST API.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport for the API rooted at `base_url`
    /// (for example `http://localhost:8002/api`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl SnapshotTransport for HttpTransport {
    fn fetch(&self, request: FetchRequest) -> BoxFuture<'_, Result<Snapshot, SyncError>> {
        let url = self.url(&request.path());
        Box::pin(async move {
            debug!(url = %url, "GET snapshot");
            let response = self.client.get(&url).send().await?.error_for_status()?;
            let snapshot: Snapshot = response.json().await?;
            Ok(snapshot.normalized())
        })
    }

    fn restart(&self) -> BoxFuture<'_, Result<(), SyncError>> {
        let url = self.url("/simulation/start");
        Box::pin(async move {
            debug!(url = %url, "POST restart");
            self.client.post(&url).send().await?.error_for_status()?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let transport =
            HttpTransport::new("http://localhost:8002/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:8002/api");
        assert_eq!(
            transport.url(&FetchRequest::Tick.path()),
            "http://localhost:8002/api/simulation/tick"
        );
    }
}
