// ── In-memory snapshot source ──
//
// Deterministic fixtures keyed by router address. Used by tests and demos;
// failures and latency can be injected per router.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use secrecy::ExposeSecret;
use tracing::trace;

use super::SnapshotSource;
use crate::config::RouterConnection;
use crate::error::ConnectionError;
use crate::model::SnapshotDevice;

#[derive(Debug, Clone, Default)]
struct FakeRouter {
    identity: String,
    credentials: Option<(String, String)>,
    snapshot: Vec<SnapshotDevice>,
    failure: Option<ConnectionError>,
}

/// Snapshot source backed by in-process fixtures.
#[derive(Debug, Default)]
pub struct MemorySource {
    routers: DashMap<String, FakeRouter>,
    delay_ms: AtomicU64,
    fetches: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a router at `address`. Re-registering keeps its snapshot.
    pub fn add_router(&self, address: impl Into<String>, identity: impl Into<String>) {
        self.routers.entry(address.into()).or_default().identity = identity.into();
    }

    /// Require these credentials for every call against `address`.
    pub fn require_credentials(
        &self,
        address: &str,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) {
        if let Some(mut router) = self.routers.get_mut(address) {
            router.credentials = Some((username.into(), secret.into()));
        }
    }

    /// Replace the hosts `address` reports on the next fetch.
    pub fn set_snapshot(&self, address: &str, snapshot: Vec<SnapshotDevice>) {
        self.routers.entry(address.to_owned()).or_default().snapshot = snapshot;
    }

    /// Make every call against `address` fail with `error` until cleared.
    pub fn fail_with(&self, address: &str, error: ConnectionError) {
        self.routers.entry(address.to_owned()).or_default().failure = Some(error);
    }

    pub fn clear_failure(&self, address: &str) {
        if let Some(mut router) = self.routers.get_mut(address) {
            router.failure = None;
        }
    }

    /// Delay every call by `delay` (simulated network latency).
    pub fn set_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.delay_ms.store(millis, Ordering::Relaxed);
    }

    /// Number of `fetch_snapshot` calls that reached this source.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    async fn connect(&self, connection: &RouterConnection) -> Result<FakeRouter, ConnectionError> {
        let delay = self.delay_ms.load(Ordering::Relaxed);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let router = self
            .routers
            .get(&connection.address)
            .map(|r| r.value().clone())
            .ok_or_else(|| ConnectionError::Unreachable {
                address: connection.address.clone(),
                reason: "no route to host".into(),
            })?;

        if let Some(error) = router.failure.clone() {
            return Err(error);
        }
        if let Some((username, secret)) = &router.credentials {
            if *username != connection.username
                || secret.as_str() != connection.secret.expose_secret()
            {
                return Err(ConnectionError::AuthFailed {
                    address: connection.address.clone(),
                });
            }
        }
        Ok(router)
    }
}

impl SnapshotSource for MemorySource {
    async fn fetch_snapshot(
        &self,
        connection: &RouterConnection,
    ) -> Result<Vec<SnapshotDevice>, ConnectionError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let router = self.connect(connection).await?;
        trace!(address = %connection.address, hosts = router.snapshot.len(), "fixture snapshot");
        Ok(router.snapshot)
    }

    async fn identify(&self, connection: &RouterConnection) -> Result<String, ConnectionError> {
        Ok(self.connect(connection).await?.identity)
    }
}
