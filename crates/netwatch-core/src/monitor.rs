// ── Monitor facade ──
//
// Wires a snapshot source to the data store: fetch → reconcile →
// summarize, either on demand or from cancellable background pollers.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{MonitorConfig, RouterConnection};
use crate::error::{ConnectionError, CoreError};
use crate::model::{Device, ProfileId, SnapshotDevice, Summary};
use crate::source::SnapshotSource;
use crate::store::DataStore;

// ── Results ──────────────────────────────────────────────────────

/// Outcome of probing a router's credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionResult {
    pub success: bool,
    pub message: String,
    pub router_identity: Option<String>,
}

/// Result of one fetch → reconcile → summarize pass.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub profile_id: ProfileId,
    pub devices: Vec<Arc<Device>>,
    pub summary: Summary,
}

/// Latest state published by a background poller.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// No tick has completed yet.
    Pending,
    Synced {
        report: Arc<SyncReport>,
        at: DateTime<Utc>,
    },
    Failed {
        message: String,
        retryable: bool,
        /// Summary of whatever is stored, so consumers can keep showing
        /// last-known counts.
        last_known: Option<Summary>,
        at: DateTime<Utc>,
    },
}

// ── PollerHandle ─────────────────────────────────────────────────

/// Handle to a running background poller.
///
/// Dropping the handle does not stop the task; call [`stop`](Self::stop)
/// or shut the whole monitor down.
pub struct PollerHandle {
    profile_id: ProfileId,
    outcome: watch::Receiver<PollOutcome>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn profile_id(&self) -> ProfileId {
        self.profile_id
    }

    /// Subscribe to poll outcomes.
    pub fn outcomes(&self) -> watch::Receiver<PollOutcome> {
        self.outcome.clone()
    }

    pub fn latest(&self) -> PollOutcome {
        self.outcome.borrow().clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the poller and wait for its task to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(profile_id = %self.profile_id, error = %e, "poller task ended abnormally");
        }
    }
}

// ── Monitor ──────────────────────────────────────────────────────

/// Entry point for consumers.
///
/// Cheaply cloneable. Owns a shared [`DataStore`] and a
/// [`SnapshotSource`]; every operation that talks to a router is bounded
/// by [`MonitorConfig::fetch_timeout`].
pub struct Monitor<S> {
    inner: Arc<MonitorInner<S>>,
}

struct MonitorInner<S> {
    config: MonitorConfig,
    store: Arc<DataStore>,
    source: S,
    cancel: CancellationToken,
}

impl<S> Clone for Monitor<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: SnapshotSource + 'static> Monitor<S> {
    pub fn new(config: MonitorConfig, store: Arc<DataStore>, source: S) -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                config,
                store,
                source,
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    pub fn source(&self) -> &S {
        &self.inner.source
    }

    // ── Router access ────────────────────────────────────────────

    /// Fetch a snapshot, giving up after the configured timeout.
    pub async fn fetch(
        &self,
        connection: &RouterConnection,
    ) -> Result<Vec<SnapshotDevice>, ConnectionError> {
        let limit = self.inner.config.fetch_timeout;
        tokio::time::timeout(limit, self.inner.source.fetch_snapshot(connection))
            .await
            .unwrap_or_else(|_| Err(timeout_error(connection, limit)))
    }

    /// Probe a router. Failures are reported in the result, never as errors.
    pub async fn test_connection(&self, connection: &RouterConnection) -> ConnectionResult {
        if let Err(e) = connection.validate() {
            return ConnectionResult {
                success: false,
                message: e.to_string(),
                router_identity: None,
            };
        }

        let limit = self.inner.config.fetch_timeout;
        let probe = tokio::time::timeout(limit, self.inner.source.identify(connection))
            .await
            .unwrap_or_else(|_| Err(timeout_error(connection, limit)));

        match probe {
            Ok(identity) => {
                debug!(address = %connection.address, identity = %identity, "connection test passed");
                ConnectionResult {
                    success: true,
                    message: format!("Connected to {identity}"),
                    router_identity: Some(identity),
                }
            }
            Err(e) => {
                debug!(address = %connection.address, error = %e, "connection test failed");
                ConnectionResult {
                    success: false,
                    message: e.to_string(),
                    router_identity: None,
                }
            }
        }
    }

    // ── Sync ─────────────────────────────────────────────────────

    /// Fetch with the profile's stored credentials, reconcile and
    /// summarize. A failed fetch leaves the store untouched.
    pub async fn sync(&self, profile_id: ProfileId) -> Result<SyncReport, CoreError> {
        let store = &self.inner.store;
        let profile = store.profile(profile_id)?;
        let connection = RouterConnection::from(profile.as_ref());

        let snapshot = self.fetch(&connection).await?;
        let devices = store.reconcile(profile_id, snapshot).await?;
        let summary = store.summarize(profile_id)?;

        Ok(SyncReport {
            profile_id,
            devices,
            summary,
        })
    }

    /// Sync the profile whose stored credentials equal `connection`.
    pub async fn sync_connection(
        &self,
        connection: &RouterConnection,
    ) -> Result<SyncReport, CoreError> {
        connection.validate()?;
        let profile = self
            .inner
            .store
            .find_profile_by_connection(connection)
            .ok_or_else(|| CoreError::NotFound {
                entity: "router profile",
                identifier: format!("{}@{}", connection.username, connection.address),
            })?;
        self.sync(profile.id).await
    }

    // ── Background polling ───────────────────────────────────────

    /// Start polling `profile_id` every `period` (the configured
    /// `poll_interval` when `None`). The first poll runs immediately.
    pub fn spawn_poller(
        &self,
        profile_id: ProfileId,
        period: Option<Duration>,
    ) -> Result<PollerHandle, CoreError> {
        self.inner.store.profile(profile_id)?;
        let period = period.unwrap_or(self.inner.config.poll_interval);
        if period.is_zero() {
            return Err(CoreError::Validation {
                field: "poll_interval".into(),
                reason: "must be greater than zero".into(),
            });
        }

        let (tx, outcome) = watch::channel(PollOutcome::Pending);
        let cancel = self.inner.cancel.child_token();
        let task = tokio::spawn(poll_task(
            self.clone(),
            profile_id,
            period,
            cancel.clone(),
            tx,
        ));
        info!(profile_id = %profile_id, period_secs = period.as_secs_f64(), "poller started");

        Ok(PollerHandle {
            profile_id,
            outcome,
            cancel,
            task,
        })
    }

    /// Cancel every poller spawned from this monitor.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }
}

fn timeout_error(connection: &RouterConnection, limit: Duration) -> ConnectionError {
    ConnectionError::Timeout {
        address: connection.address.clone(),
        timeout_secs: limit.as_secs(),
    }
}

// ── Background task ──────────────────────────────────────────────

async fn poll_task<S: SnapshotSource + 'static>(
    monitor: Monitor<S>,
    profile_id: ProfileId,
    period: Duration,
    cancel: CancellationToken,
    tx: watch::Sender<PollOutcome>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let result = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    result = monitor.sync(profile_id) => result,
                };
                let outcome = match result {
                    Ok(report) => PollOutcome::Synced {
                        report: Arc::new(report),
                        at: Utc::now(),
                    },
                    Err(e) => {
                        warn!(profile_id = %profile_id, error = %e, "poll failed");
                        PollOutcome::Failed {
                            message: e.to_string(),
                            retryable: e.is_retryable(),
                            last_known: monitor.store().summarize(profile_id).ok(),
                            at: Utc::now(),
                        }
                    }
                };
                tx.send_replace(outcome);
            }
        }
    }
    debug!(profile_id = %profile_id, "poller stopped");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{DeviceStatus, NewProfile};
    use crate::source::MemorySource;

    fn monitor() -> (Monitor<MemorySource>, ProfileId) {
        let store = Arc::new(DataStore::new());
        let pid = store
            .create_profile(NewProfile::new("lab", "10.0.0.1", "admin", "pw"))
            .unwrap()
            .id;
        let source = MemorySource::new();
        source.add_router("10.0.0.1", "lab-rtr");
        source.require_credentials("10.0.0.1", "admin", "pw");
        (Monitor::new(MonitorConfig::default(), store, source), pid)
    }

    #[tokio::test]
    async fn sync_reconciles_and_summarizes() {
        let (monitor, pid) = monitor();
        monitor.source().set_snapshot(
            "10.0.0.1",
            vec![
                SnapshotDevice::new("*1", "8.8.8.8", DeviceStatus::Up, Utc::now()),
                SnapshotDevice::new("*2", "1.1.1.1", DeviceStatus::Down, Utc::now()),
            ],
        );

        let report = monitor.sync(pid).await.unwrap();

        assert_eq!(report.devices.len(), 2);
        assert_eq!(report.summary.total_devices, 2);
        assert_eq!(report.summary.up_devices, 1);
    }

    #[tokio::test]
    async fn sync_connection_requires_matching_secret() {
        let (monitor, pid) = monitor();
        let ok = RouterConnection::new("10.0.0.1", "admin", "pw");
        let bad = RouterConnection::new("10.0.0.1", "admin", "other");

        assert_eq!(monitor.sync_connection(&ok).await.unwrap().profile_id, pid);
        assert!(matches!(
            monitor.sync_connection(&bad).await,
            Err(CoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_connection_reports_instead_of_failing() {
        let (monitor, _) = monitor();

        let ok = monitor
            .test_connection(&RouterConnection::new("10.0.0.1", "admin", "pw"))
            .await;
        assert!(ok.success);
        assert_eq!(ok.router_identity.as_deref(), Some("lab-rtr"));

        let denied = monitor
            .test_connection(&RouterConnection::new("10.0.0.1", "admin", "nope"))
            .await;
        assert!(!denied.success);
        assert!(denied.router_identity.is_none());

        let blank = monitor
            .test_connection(&RouterConnection::new("", "admin", "pw"))
            .await;
        assert!(!blank.success);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_source_times_out_without_writes() {
        let (monitor, pid) = monitor();
        monitor.source().set_snapshot(
            "10.0.0.1",
            vec![SnapshotDevice::new("*1", "8.8.8.8", DeviceStatus::Up, Utc::now())],
        );
        monitor.source().set_delay(Duration::from_secs(60));

        let err = monitor.sync(pid).await.unwrap_err();

        assert!(matches!(
            err,
            CoreError::Connection(ConnectionError::Timeout {
                timeout_secs: 10,
                ..
            })
        ));
        assert!(err.is_retryable());
        assert_eq!(monitor.store().device_count(), 0);
    }

    #[tokio::test]
    async fn zero_period_poller_is_rejected() {
        let (monitor, pid) = monitor();
        assert!(matches!(
            monitor.spawn_poller(pid, Some(Duration::ZERO)),
            Err(CoreError::Validation { .. })
        ));
        assert!(matches!(
            monitor.spawn_poller(ProfileId(42), None),
            Err(CoreError::NotFound { .. })
        ));
    }
}
