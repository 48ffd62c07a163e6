// ── Snapshot reconciliation ──
//
// Merges one router snapshot into the device table. Rows are matched by
// (profile, native id), upserted in place and never pruned: hosts missing
// from a snapshot keep their last-seen state.

use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;
use tracing::{debug, info};

use super::DataStore;
use crate::error::CoreError;
use crate::model::{Device, DeviceKey, NativeId, ProfileId, SnapshotDevice};

/// Validate every entry and collapse repeated native ids (last one wins,
/// position of the first is kept). Nothing is written if this fails.
fn prepare_batch(
    snapshot: Vec<SnapshotDevice>,
) -> Result<IndexMap<NativeId, SnapshotDevice>, CoreError> {
    let mut batch = IndexMap::with_capacity(snapshot.len());
    for (index, mut seen) in snapshot.into_iter().enumerate() {
        if seen.native_id.is_empty() {
            return Err(CoreError::Validation {
                field: format!("snapshot[{index}].native_id"),
                reason: "must not be empty".into(),
            });
        }
        seen.address = seen.address.trim().to_owned();
        if seen.address.is_empty() {
            return Err(CoreError::Validation {
                field: format!("snapshot[{index}].address"),
                reason: format!("must not be empty (native id {})", seen.native_id),
            });
        }
        seen.label = non_blank(seen.label);
        seen.timeout = non_blank(seen.timeout);
        seen.interval = non_blank(seen.interval);
        batch.insert(seen.native_id.clone(), seen);
    }
    Ok(batch)
}

/// Routers report "no comment" as an empty string.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl DataStore {
    /// Merge a snapshot into the stored devices of `profile_id`.
    ///
    /// Returns one row per distinct native id in the snapshot, in the
    /// order first seen. Fails with `NotFound` for an unknown profile and
    /// with `Validation` for a malformed entry; neither writes anything.
    pub async fn reconcile(
        &self,
        profile_id: ProfileId,
        snapshot: Vec<SnapshotDevice>,
    ) -> Result<Vec<Arc<Device>>, CoreError> {
        let guard = self.lock_profile(profile_id).await;

        if self.profiles.get_by_key(&profile_id).is_none() {
            drop(guard);
            self.forget_profile_lock(profile_id);
            return Err(CoreError::profile_not_found(profile_id));
        }
        let batch = prepare_batch(snapshot)?;

        let now = Utc::now();
        let mut reconciled = Vec::with_capacity(batch.len());
        let mut created = 0usize;
        let mut transitions = 0usize;

        for (native_id, seen) in batch {
            let key = DeviceKey::new(profile_id, native_id);
            let mut previous_status = None;
            let (device, is_new) = self.devices.upsert_with(key, |current| match current {
                Some(existing) => {
                    previous_status = Some(existing.status);
                    existing.resighted(seen, now)
                }
                None => Device::first_sighting(self.allocate_device_id(), profile_id, seen, now),
            });

            if is_new {
                created += 1;
                debug!(
                    profile_id = %profile_id,
                    device_id = %device.id,
                    native_id = %device.native_id,
                    status = %device.status,
                    "device first seen"
                );
            } else if previous_status.is_some_and(|s| s != device.status) {
                transitions += 1;
                debug!(
                    profile_id = %profile_id,
                    device_id = %device.id,
                    native_id = %device.native_id,
                    status = %device.status,
                    "device status changed"
                );
            }
            reconciled.push(device);
        }

        info!(
            profile_id = %profile_id,
            reconciled = reconciled.len(),
            created,
            transitions,
            "snapshot reconciled"
        );
        Ok(reconciled)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{DeviceStatus, NewProfile};
    use chrono::{DateTime, TimeZone};
    use pretty_assertions::assert_eq;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn store_with_profile() -> (DataStore, ProfileId) {
        let store = DataStore::new();
        let profile = store
            .create_profile(NewProfile::new("lab", "10.0.0.1", "admin", "pw"))
            .unwrap();
        (store, profile.id)
    }

    #[tokio::test]
    async fn duplicate_native_ids_collapse_last_write_wins() {
        let (store, pid) = store_with_profile();
        let snapshot = vec![
            SnapshotDevice::new("*1", "8.8.8.8", DeviceStatus::Up, t(0)),
            SnapshotDevice::new("*2", "1.1.1.1", DeviceStatus::Up, t(0)),
            SnapshotDevice::new("*1", "8.8.4.4", DeviceStatus::Down, t(5)),
        ];

        let rows = store.reconcile(pid, snapshot).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].native_id.as_str(), "*1");
        assert_eq!(rows[0].address, "8.8.4.4");
        assert_eq!(rows[0].status, DeviceStatus::Down);
        assert_eq!(store.device_count_for(pid), 2);
    }

    #[tokio::test]
    async fn invalid_entry_aborts_without_writes() {
        let (store, pid) = store_with_profile();
        let snapshot = vec![
            SnapshotDevice::new("*1", "8.8.8.8", DeviceStatus::Up, t(0)),
            SnapshotDevice::new("*2", "   ", DeviceStatus::Up, t(0)),
        ];

        let err = store.reconcile(pid, snapshot).await.unwrap_err();

        assert!(matches!(err, CoreError::Validation { ref field, .. } if field == "snapshot[1].address"));
        assert_eq!(store.device_count(), 0);
    }

    #[tokio::test]
    async fn blank_optional_fields_are_stored_as_none() {
        let (store, pid) = store_with_profile();
        let seen = SnapshotDevice::new("*1", "8.8.8.8", DeviceStatus::Up, t(0))
            .with_label("")
            .with_timing("", "00:01:00");

        let rows = store.reconcile(pid, vec![seen]).await.unwrap();

        assert_eq!(rows[0].label, None);
        assert_eq!(rows[0].timeout, None);
        assert_eq!(rows[0].interval.as_deref(), Some("00:01:00"));
    }

    #[tokio::test]
    async fn vanished_devices_are_left_untouched() {
        let (store, pid) = store_with_profile();
        store
            .reconcile(
                pid,
                vec![
                    SnapshotDevice::new("*1", "8.8.8.8", DeviceStatus::Up, t(0)),
                    SnapshotDevice::new("*2", "1.1.1.1", DeviceStatus::Up, t(0)),
                ],
            )
            .await
            .unwrap();
        let before = store
            .device_by_native_id(pid, &NativeId::new("*2"))
            .unwrap();

        let rows = store
            .reconcile(
                pid,
                vec![SnapshotDevice::new("*1", "8.8.8.8", DeviceStatus::Down, t(9))],
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(store.device_count_for(pid), 2);
        let after = store
            .device_by_native_id(pid, &NativeId::new("*2"))
            .unwrap();
        assert_eq!(*after, *before);
    }

    #[tokio::test]
    async fn unknown_profile_leaves_no_lock_behind() {
        let store = DataStore::new();
        let seen = SnapshotDevice::new("*1", "8.8.8.8", DeviceStatus::Up, t(0));

        for _ in 0..3 {
            let err = store.reconcile(ProfileId(99), vec![seen.clone()]).await;
            assert!(matches!(err, Err(CoreError::NotFound { .. })));
        }
        assert!(store.profile_locks.is_empty());
        assert_eq!(store.device_count(), 0);
    }

    #[tokio::test]
    async fn lock_entry_survives_while_held_elsewhere() {
        let (store, pid) = store_with_profile();
        let held = store.lock_profile(pid).await;

        store.forget_profile_lock(pid);
        assert_eq!(store.profile_locks.len(), 1);

        drop(held);
        store.forget_profile_lock(pid);
        assert!(store.profile_locks.is_empty());
    }

    #[tokio::test]
    async fn same_native_id_under_two_profiles_is_two_rows() {
        let (store, first) = store_with_profile();
        let second = store
            .create_profile(NewProfile::new("branch", "10.0.1.1", "admin", "pw"))
            .unwrap()
            .id;
        let seen = SnapshotDevice::new("*1", "8.8.8.8", DeviceStatus::Up, t(0));

        let a = store.reconcile(first, vec![seen.clone()]).await.unwrap();
        let b = store.reconcile(second, vec![seen]).await.unwrap();

        assert_ne!(a[0].id, b[0].id);
        assert_eq!(store.device_count(), 2);
    }
}
