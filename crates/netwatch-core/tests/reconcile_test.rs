// Store-level scenarios for snapshot reconciliation.
#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;

use netwatch_core::{
    CoreError, DataStore, DeviceQuery, DeviceStatus, NativeId, NewProfile, ProfileId,
    SnapshotDevice, StatusFilter,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn at(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap() + chrono::Duration::minutes(minute)
}

fn store_with_profile() -> (DataStore, ProfileId) {
    let store = DataStore::new();
    let pid = store
        .create_profile(NewProfile::new("core", "192.168.88.1", "admin", "pw"))
        .unwrap()
        .id;
    (store, pid)
}

fn google(status: DeviceStatus, since: DateTime<Utc>) -> SnapshotDevice {
    SnapshotDevice::new("*1", "8.8.8.8", status, since).with_label("Google DNS")
}

// ── Scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_up_then_down_keeps_identity_and_moves_summary() {
    let (store, pid) = store_with_profile();

    let first = store
        .reconcile(pid, vec![google(DeviceStatus::Up, at(0))])
        .await
        .unwrap();
    let summary = store.summarize(pid).unwrap();
    assert_eq!(
        (summary.total_devices, summary.up_devices, summary.down_devices),
        (1, 1, 0)
    );

    let second = store
        .reconcile(pid, vec![google(DeviceStatus::Down, at(7))])
        .await
        .unwrap();
    let summary = store.summarize(pid).unwrap();
    assert_eq!(
        (summary.total_devices, summary.up_devices, summary.down_devices),
        (1, 0, 1)
    );

    assert_eq!(store.device_count(), 1);
    assert_eq!(second[0].id, first[0].id);
    assert_eq!(second[0].created_at, first[0].created_at);
    assert_eq!(second[0].status, DeviceStatus::Down);
    assert_eq!(second[0].since, at(7));
}

#[tokio::test]
async fn test_same_snapshot_twice_is_idempotent() {
    let (store, pid) = store_with_profile();
    let snapshot = vec![
        google(DeviceStatus::Up, at(0)),
        SnapshotDevice::new("*2", "1.1.1.1", DeviceStatus::Down, at(1)),
    ];

    let first = store.reconcile(pid, snapshot.clone()).await.unwrap();
    let second = store.reconcile(pid, snapshot).await.unwrap();

    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.status, b.status);
        assert_eq!(a.since, b.since);
        assert_eq!(a.address, b.address);
        assert_eq!(a.label, b.label);
        assert!(b.updated_at >= a.updated_at);
    }
    assert_eq!(store.device_count_for(pid), 2);
}

#[tokio::test]
async fn test_since_is_kept_while_status_holds() {
    let (store, pid) = store_with_profile();
    store
        .reconcile(pid, vec![google(DeviceStatus::Up, at(0))])
        .await
        .unwrap();

    let rows = store
        .reconcile(
            pid,
            vec![
                SnapshotDevice::new("*1", "8.8.4.4", DeviceStatus::Up, at(30))
                    .with_label("Google DNS secondary"),
            ],
        )
        .await
        .unwrap();

    assert_eq!(rows[0].since, at(0));
    assert_eq!(rows[0].address, "8.8.4.4");
    assert_eq!(rows[0].label.as_deref(), Some("Google DNS secondary"));
}

#[tokio::test]
async fn test_missing_profile_is_not_found_and_writes_nothing() {
    let store = DataStore::new();

    let err = store
        .reconcile(ProfileId(999), vec![google(DeviceStatus::Up, at(0))])
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::NotFound { .. }));
    assert_eq!(store.device_count(), 0);
}

#[tokio::test]
async fn test_summary_counts_always_add_up() {
    let (store, pid) = store_with_profile();
    let snapshot: Vec<_> = (0..25)
        .map(|i| {
            let status = if i % 3 == 0 {
                DeviceStatus::Down
            } else {
                DeviceStatus::Up
            };
            SnapshotDevice::new(format!("*{i:X}"), format!("10.1.0.{i}"), status, at(i))
        })
        .collect();
    store.reconcile(pid, snapshot).await.unwrap();

    let summary = store.summarize(pid).unwrap();
    assert_eq!(summary.up_devices + summary.down_devices, summary.total_devices);
    assert_eq!(summary.total_devices, store.device_count_for(pid));
    assert_eq!(summary.down_devices, 9);

    let down = store
        .list_devices(pid, &DeviceQuery::new().status(StatusFilter::Down))
        .unwrap();
    assert_eq!(down.len(), summary.down_devices);
}

#[tokio::test]
async fn test_delete_blocked_until_devices_are_forgotten() {
    let (store, pid) = store_with_profile();
    let rows = store
        .reconcile(
            pid,
            vec![
                google(DeviceStatus::Up, at(0)),
                SnapshotDevice::new("*2", "1.1.1.1", DeviceStatus::Up, at(0)),
            ],
        )
        .await
        .unwrap();

    assert!(matches!(
        store.delete_profile(pid).await,
        Err(CoreError::Conflict {
            device_count: 2,
            ..
        })
    ));

    for row in &rows {
        store.forget_device(row.id).await.unwrap();
    }
    assert!(matches!(
        store.forget_device(rows[0].id).await,
        Err(CoreError::NotFound { .. })
    ));

    store.delete_profile(pid).await.unwrap();
    assert!(matches!(store.profile(pid), Err(CoreError::NotFound { .. })));
}

#[tokio::test]
async fn test_forgotten_device_returns_with_a_new_id() {
    let (store, pid) = store_with_profile();
    let first = store
        .reconcile(pid, vec![google(DeviceStatus::Up, at(0))])
        .await
        .unwrap();
    store.forget_device(first[0].id).await.unwrap();

    let again = store
        .reconcile(pid, vec![google(DeviceStatus::Up, at(0))])
        .await
        .unwrap();

    assert_ne!(again[0].id, first[0].id);
    assert!(
        store
            .device_by_native_id(pid, &NativeId::new("*1"))
            .is_some()
    );
}

// ── Concurrency ─────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_passes_produce_one_row_per_key() {
    let (store, pid) = store_with_profile();
    let store = Arc::new(store);
    let snapshot: Vec<_> = (0..10)
        .map(|i| SnapshotDevice::new(format!("*{i}"), format!("10.2.0.{i}"), DeviceStatus::Up, at(0)))
        .collect();

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let store = Arc::clone(&store);
        let snapshot = snapshot.clone();
        tasks.push(tokio::spawn(async move {
            store.reconcile(pid, snapshot).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(store.device_count_for(pid), 10);
    let mut ids: Vec<_> = store.devices_for(pid).iter().map(|d| d.id).collect();
    ids.dedup();
    assert_eq!(ids.len(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_parallel_profiles_all_rows_visible_to_summary_and_delete() {
    for _ in 0..50 {
        let store = Arc::new(DataStore::new());
        let pids: Vec<ProfileId> = (0..8)
            .map(|i| {
                store
                    .create_profile(NewProfile::new(
                        format!("rtr-{i}"),
                        format!("10.9.{i}.1"),
                        "admin",
                        "pw",
                    ))
                    .unwrap()
                    .id
            })
            .collect();

        let mut tasks = Vec::new();
        for &pid in &pids {
            let store = Arc::clone(&store);
            let snapshot: Vec<_> = (0..20)
                .map(|h| {
                    SnapshotDevice::new(
                        format!("*{h}"),
                        format!("10.3.{}.{h}", pid.0),
                        DeviceStatus::Up,
                        at(0),
                    )
                })
                .collect();
            tasks.push(tokio::spawn(async move {
                store.reconcile(pid, snapshot).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        for &pid in &pids {
            assert_eq!(store.summarize(pid).unwrap().total_devices, 20);
            assert_eq!(store.devices_for(pid).len(), 20);
            assert!(matches!(
                store.delete_profile(pid).await,
                Err(CoreError::Conflict { device_count: 20, .. })
            ));
        }
        assert_eq!(store.to_state().devices.len(), 160);
    }
}
