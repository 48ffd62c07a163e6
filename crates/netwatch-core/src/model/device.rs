// ── Device domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::ids::{DeviceId, NativeId, ProfileId};

/// Reachability of a monitored host as reported by the router.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DeviceStatus {
    Up,
    Down,
}

impl DeviceStatus {
    pub fn is_up(self) -> bool {
        matches!(self, Self::Up)
    }
}

/// One monitored host as seen in a single snapshot.
///
/// Field aliases accept RouterOS `/tool/netwatch` export naming
/// (`.id`, `host`, `comment`) alongside the canonical names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDevice {
    #[serde(alias = ".id")]
    pub native_id: NativeId,
    #[serde(alias = "host")]
    pub address: String,
    #[serde(default, alias = "comment")]
    pub label: Option<String>,
    pub status: DeviceStatus,
    pub since: DateTime<Utc>,
    #[serde(default)]
    pub timeout: Option<String>,
    #[serde(default)]
    pub interval: Option<String>,
}

impl SnapshotDevice {
    pub fn new(
        native_id: impl Into<NativeId>,
        address: impl Into<String>,
        status: DeviceStatus,
        since: DateTime<Utc>,
    ) -> Self {
        Self {
            native_id: native_id.into(),
            address: address.into(),
            label: None,
            status,
            since,
            timeout: None,
            interval: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_timing(mut self, timeout: impl Into<String>, interval: impl Into<String>) -> Self {
        self.timeout = Some(timeout.into());
        self.interval = Some(interval.into());
        self
    }
}

/// A stored row replayed as a sighting, for merging it into another store.
impl From<&Device> for SnapshotDevice {
    fn from(d: &Device) -> Self {
        Self {
            native_id: d.native_id.clone(),
            address: d.address.clone(),
            label: d.label.clone(),
            status: d.status,
            since: d.since,
            timeout: d.timeout.clone(),
            interval: d.interval.clone(),
        }
    }
}

/// A persisted device row, owned by one router profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub router_profile_id: ProfileId,
    pub native_id: NativeId,
    pub address: String,
    pub label: Option<String>,
    pub status: DeviceStatus,
    /// When the status last changed, not when the host was last polled.
    pub since: DateTime<Utc>,
    pub timeout: Option<String>,
    pub interval: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Device {
    /// Build a fresh row from its first sighting.
    pub(crate) fn first_sighting(
        id: DeviceId,
        profile_id: ProfileId,
        seen: SnapshotDevice,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            router_profile_id: profile_id,
            native_id: seen.native_id,
            address: seen.address,
            label: seen.label,
            status: seen.status,
            since: seen.since,
            timeout: seen.timeout,
            interval: seen.interval,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a later sighting of the same host.
    ///
    /// `since` only moves when the status actually flips, so the
    /// time-in-state does not drift on every poll.
    pub(crate) fn resighted(&self, seen: SnapshotDevice, now: DateTime<Utc>) -> Self {
        let transitioned = seen.status != self.status;
        Self {
            id: self.id,
            router_profile_id: self.router_profile_id,
            native_id: self.native_id.clone(),
            address: seen.address,
            label: seen.label,
            status: seen.status,
            since: if transitioned { seen.since } else { self.since },
            timeout: seen.timeout,
            interval: seen.interval,
            created_at: self.created_at,
            updated_at: now,
        }
    }

    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.address)
    }
}
