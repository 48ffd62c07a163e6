// ── Central data store ──
//
// Thread-safe storage for router profiles and their devices. Devices are
// keyed by (profile, native id); both entity kinds are also reachable
// through their numeric surrogate ids.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::collection::{EntityCollection, Identified};
use crate::error::CoreError;
use crate::model::{Device, DeviceId, DeviceKey, NativeId, ProfileId, RouterProfile};

impl Identified for Device {
    fn surrogate_id(&self) -> u64 {
        self.id.0
    }
}

impl Identified for RouterProfile {
    fn surrogate_id(&self) -> u64 {
        self.id.0
    }
}

/// Central store for router profiles and monitored devices.
///
/// Reads are wait-free snapshots. Per-key writes are atomic; a whole
/// reconciliation pass or a profile deletion additionally holds that
/// profile's async lock.
pub struct DataStore {
    pub(crate) profiles: EntityCollection<ProfileId, RouterProfile>,
    pub(crate) devices: EntityCollection<DeviceKey, Device>,
    next_profile_id: AtomicU64,
    next_device_id: AtomicU64,
    pub(crate) profile_locks: DashMap<ProfileId, Arc<Mutex<()>>>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::with_counters(1, 1)
    }

    pub(crate) fn with_counters(next_profile_id: u64, next_device_id: u64) -> Self {
        Self {
            profiles: EntityCollection::new(),
            devices: EntityCollection::new(),
            next_profile_id: AtomicU64::new(next_profile_id.max(1)),
            next_device_id: AtomicU64::new(next_device_id.max(1)),
            profile_locks: DashMap::new(),
        }
    }

    // ── Id allocation ────────────────────────────────────────────────

    pub(crate) fn allocate_profile_id(&self) -> ProfileId {
        ProfileId(self.next_profile_id.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn allocate_device_id(&self) -> DeviceId {
        DeviceId(self.next_device_id.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn peek_counters(&self) -> (u64, u64) {
        (
            self.next_profile_id.load(Ordering::Relaxed),
            self.next_device_id.load(Ordering::Relaxed),
        )
    }

    // ── Locking ──────────────────────────────────────────────────────

    /// Serialize mutating passes over one profile's devices.
    pub(crate) async fn lock_profile(&self, id: ProfileId) -> OwnedMutexGuard<()> {
        let lock = Arc::clone(self.profile_locks.entry(id).or_default().value());
        lock.lock_owned().await
    }

    /// Drop the lock entry for `id` unless another task still holds or
    /// waits on it. Call after releasing the guard.
    pub(crate) fn forget_profile_lock(&self, id: ProfileId) {
        self.profile_locks
            .remove_if(&id, |_, lock| Arc::strong_count(lock) == 1);
    }

    // ── Device lookups ───────────────────────────────────────────────

    /// Look up a device by its local surrogate id.
    pub fn device(&self, id: DeviceId) -> Result<Arc<Device>, CoreError> {
        self.devices
            .get_by_id(id.0)
            .ok_or_else(|| CoreError::device_not_found(id))
    }

    /// Look up a device by its durable composite identity.
    pub fn device_by_native_id(
        &self,
        profile_id: ProfileId,
        native_id: &NativeId,
    ) -> Option<Arc<Device>> {
        self.devices
            .get_by_key(&DeviceKey::new(profile_id, native_id.clone()))
    }

    /// All devices of one profile, ordered by local id.
    pub fn devices_for(&self, profile_id: ProfileId) -> Vec<Arc<Device>> {
        self.devices
            .snapshot()
            .iter()
            .filter(|d| d.router_profile_id == profile_id)
            .cloned()
            .collect()
    }

    /// Number of devices referencing one profile.
    pub fn device_count_for(&self, profile_id: ProfileId) -> usize {
        self.devices
            .snapshot()
            .iter()
            .filter(|d| d.router_profile_id == profile_id)
            .count()
    }

    /// Total number of stored devices across all profiles.
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Remove a single device row out of band. Reconciliation never
    /// deletes rows on its own.
    pub async fn forget_device(&self, id: DeviceId) -> Result<Arc<Device>, CoreError> {
        let owner = self.device(id)?.router_profile_id;
        let _guard = self.lock_profile(owner).await;
        let removed = self
            .devices
            .remove_by_id(id.0)
            .ok_or_else(|| CoreError::device_not_found(id))?;
        tracing::info!(device_id = %id, profile_id = %owner, "device forgotten");
        Ok(removed)
    }

}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}
