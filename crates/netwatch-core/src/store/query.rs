// ── Read-side device filtering ──

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::DataStore;
use crate::error::CoreError;
use crate::model::{Device, DeviceStatus, ProfileId};

/// Status constraint for a device listing.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StatusFilter {
    #[default]
    All,
    Up,
    Down,
}

impl StatusFilter {
    pub fn matches(self, status: DeviceStatus) -> bool {
        match self {
            Self::All => true,
            Self::Up => status == DeviceStatus::Up,
            Self::Down => status == DeviceStatus::Down,
        }
    }
}

/// Conjunctive filter over one profile's devices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceQuery {
    /// Case-insensitive substring matched against address or label.
    pub search: Option<String>,
    pub status: StatusFilter,
}

impl DeviceQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn matches(&self, device: &Device) -> bool {
        if !self.status.matches(device.status) {
            return false;
        }
        match self.search.as_deref().map(str::to_lowercase) {
            None => true,
            Some(term) if term.is_empty() => true,
            Some(term) => {
                device.address.to_lowercase().contains(&term)
                    || device
                        .label
                        .as_deref()
                        .is_some_and(|label| label.to_lowercase().contains(&term))
            }
        }
    }
}

impl DataStore {
    /// Devices of one profile matching `query`, ordered by local id.
    pub fn list_devices(
        &self,
        profile_id: ProfileId,
        query: &DeviceQuery,
    ) -> Result<Vec<Arc<Device>>, CoreError> {
        self.profile(profile_id)?;
        Ok(self
            .devices
            .snapshot()
            .iter()
            .filter(|d| d.router_profile_id == profile_id && query.matches(d))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{NewProfile, SnapshotDevice};
    use chrono::Utc;

    async fn seeded() -> (DataStore, ProfileId) {
        let store = DataStore::new();
        let pid = store
            .create_profile(NewProfile::new("lab", "10.0.0.1", "admin", "pw"))
            .unwrap()
            .id;
        let now = Utc::now();
        store
            .reconcile(
                pid,
                vec![
                    SnapshotDevice::new("*1", "8.8.8.8", DeviceStatus::Up, now)
                        .with_label("Google DNS"),
                    SnapshotDevice::new("*2", "192.168.1.100", DeviceStatus::Down, now)
                        .with_label("Server Internal"),
                    SnapshotDevice::new("*3", "1.1.1.1", DeviceStatus::Down, now)
                        .with_label("Cloudflare DNS"),
                    SnapshotDevice::new("*4", "10.0.0.53", DeviceStatus::Up, now),
                ],
            )
            .await
            .unwrap();
        (store, pid)
    }

    fn natives(rows: &[Arc<Device>]) -> Vec<&str> {
        rows.iter().map(|d| d.native_id.as_str()).collect()
    }

    #[test]
    fn status_filter_parses() {
        assert_eq!("ALL".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!("down".parse::<StatusFilter>().unwrap(), StatusFilter::Down);
        assert_eq!(StatusFilter::default(), StatusFilter::All);
    }

    #[tokio::test]
    async fn no_filters_returns_everything() {
        let (store, pid) = seeded().await;
        let rows = store.list_devices(pid, &DeviceQuery::new()).unwrap();
        assert_eq!(natives(&rows), vec!["*1", "*2", "*3", "*4"]);
    }

    #[tokio::test]
    async fn search_matches_label_case_insensitively() {
        let (store, pid) = seeded().await;
        let rows = store
            .list_devices(pid, &DeviceQuery::new().search("dns"))
            .unwrap();
        assert_eq!(natives(&rows), vec!["*1", "*3"]);
    }

    #[tokio::test]
    async fn search_and_status_are_conjunctive() {
        let (store, pid) = seeded().await;
        let rows = store
            .list_devices(
                pid,
                &DeviceQuery::new().search("dns").status(StatusFilter::Up),
            )
            .unwrap();
        assert_eq!(natives(&rows), vec!["*1"]);
    }

    #[tokio::test]
    async fn search_matches_address_and_skips_missing_labels() {
        let (store, pid) = seeded().await;
        let rows = store
            .list_devices(pid, &DeviceQuery::new().search("192.168"))
            .unwrap();
        assert_eq!(natives(&rows), vec!["*2"]);

        let rows = store
            .list_devices(pid, &DeviceQuery::new().search("internal"))
            .unwrap();
        assert_eq!(natives(&rows), vec!["*2"]);

        let rows = store
            .list_devices(pid, &DeviceQuery::new().search(".53"))
            .unwrap();
        assert_eq!(natives(&rows), vec!["*4"]);
    }

    #[tokio::test]
    async fn empty_search_term_is_ignored() {
        let (store, pid) = seeded().await;
        let rows = store
            .list_devices(pid, &DeviceQuery::new().search("").status(StatusFilter::Down))
            .unwrap();
        assert_eq!(natives(&rows), vec!["*2", "*3"]);
    }
}
