// ── State file persistence ──
//
// The whole store round-trips through one JSON document so separate CLI
// invocations share profiles, devices and id counters.

use std::path::Path;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::DataStore;
use crate::error::CoreError;
use crate::model::{Device, DeviceKey, ProfileId, RouterProfile};

const STATE_FORMAT: u32 = 1;

/// On-disk form of a router profile. Unlike [`RouterProfile`], the secret
/// is written out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredProfile {
    pub id: ProfileId,
    pub name: String,
    pub address: String,
    pub username: String,
    pub secret: String,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&RouterProfile> for StoredProfile {
    fn from(p: &RouterProfile) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            address: p.address.clone(),
            username: p.username.clone(),
            secret: p.secret.expose_secret().to_owned(),
            is_active: p.is_active,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl From<StoredProfile> for RouterProfile {
    fn from(p: StoredProfile) -> Self {
        Self {
            id: p.id,
            name: p.name,
            address: p.address,
            username: p.username,
            secret: SecretString::from(p.secret),
            is_active: p.is_active,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Serializable image of a [`DataStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedState {
    pub format: u32,
    pub next_profile_id: u64,
    pub next_device_id: u64,
    #[serde(default)]
    pub profiles: Vec<StoredProfile>,
    #[serde(default)]
    pub devices: Vec<Device>,
}

impl DataStore {
    pub fn to_state(&self) -> PersistedState {
        let (next_profile_id, next_device_id) = self.peek_counters();
        PersistedState {
            format: STATE_FORMAT,
            next_profile_id,
            next_device_id,
            profiles: self
                .profiles
                .snapshot()
                .iter()
                .map(|p| StoredProfile::from(p.as_ref()))
                .collect(),
            devices: self
                .devices
                .snapshot()
                .iter()
                .map(|d| d.as_ref().clone())
                .collect(),
        }
    }

    /// Rebuild a store from its persisted image.
    ///
    /// Rejects images that would break the one-row-per-key invariant or
    /// that reference profiles they do not contain.
    pub fn from_state(state: PersistedState) -> Result<Self, CoreError> {
        if state.format != STATE_FORMAT {
            return Err(CoreError::Validation {
                field: "format".into(),
                reason: format!(
                    "unsupported state format {} (expected {STATE_FORMAT})",
                    state.format
                ),
            });
        }

        let max_profile = state.profiles.iter().map(|p| p.id.0).max().unwrap_or(0);
        let max_device = state.devices.iter().map(|d| d.id.0).max().unwrap_or(0);
        let store = Self::with_counters(
            state.next_profile_id.max(id_after(max_profile, "profiles")?),
            state.next_device_id.max(id_after(max_device, "devices")?),
        );

        for profile in state.profiles {
            let id = profile.id;
            if !store.profiles.insert(id, profile.into()) {
                return Err(CoreError::Validation {
                    field: "profiles".into(),
                    reason: format!("duplicate profile id {id}"),
                });
            }
        }
        for device in state.devices {
            if store.profiles.get_by_key(&device.router_profile_id).is_none() {
                return Err(CoreError::Validation {
                    field: "devices".into(),
                    reason: format!(
                        "device {} references missing router profile {}",
                        device.id, device.router_profile_id
                    ),
                });
            }
            if store.devices.get_by_id(device.id.0).is_some() {
                return Err(CoreError::Validation {
                    field: "devices".into(),
                    reason: format!("duplicate device id {}", device.id),
                });
            }
            let key = DeviceKey::new(device.router_profile_id, device.native_id.clone());
            if !store.devices.insert(key.clone(), device) {
                return Err(CoreError::Validation {
                    field: "devices".into(),
                    reason: format!("duplicate device key {key}"),
                });
            }
        }
        Ok(store)
    }

    /// Load a store from `path`. A missing file yields an empty store.
    pub async fn load(path: &Path) -> Result<Self, CoreError> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no state file yet, starting empty");
                return Ok(Self::new());
            }
            Err(e) => return Err(storage_error(path, &e)),
        };
        let state: PersistedState =
            serde_json::from_str(&raw).map_err(|e| storage_error(path, &e))?;
        let store = Self::from_state(state).map_err(|e| storage_error(path, &e))?;
        debug!(
            path = %path.display(),
            profiles = store.profiles.len(),
            devices = store.devices.len(),
            "state loaded"
        );
        Ok(store)
    }

    /// Write the store to `path`, replacing any previous file.
    pub async fn save(&self, path: &Path) -> Result<(), CoreError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error(path, &e))?;
        }
        let json =
            serde_json::to_string_pretty(&self.to_state()).map_err(|e| storage_error(path, &e))?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| storage_error(path, &e))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| storage_error(path, &e))?;
        debug!(path = %path.display(), "state saved");
        Ok(())
    }
}

/// First id free after `max`, or `Validation` when the id space is spent.
fn id_after(max: u64, field: &str) -> Result<u64, CoreError> {
    max.checked_add(1).ok_or_else(|| CoreError::Validation {
        field: field.into(),
        reason: format!("id {max} leaves no room for new ids"),
    })
}

fn storage_error(path: &Path, err: &dyn std::fmt::Display) -> CoreError {
    CoreError::Storage {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{DeviceStatus, NewProfile, SnapshotDevice};

    #[tokio::test]
    async fn save_then_load_preserves_rows_and_counters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = DataStore::new();
        let pid = store
            .create_profile(NewProfile::new("lab", "10.0.0.1", "admin", "s3cret"))
            .unwrap()
            .id;
        let rows = store
            .reconcile(
                pid,
                vec![SnapshotDevice::new("*1", "8.8.8.8", DeviceStatus::Up, Utc::now())],
            )
            .await
            .unwrap();
        store.save(&path).await.unwrap();

        let loaded = DataStore::load(&path).await.unwrap();
        let profile = loaded.profile(pid).unwrap();
        assert_eq!(profile.secret.expose_secret(), "s3cret");
        assert_eq!(*loaded.device(rows[0].id).unwrap(), *rows[0]);

        let next = loaded
            .create_profile(NewProfile::new("other", "10.0.0.2", "admin", "pw"))
            .unwrap();
        assert_eq!(next.id, ProfileId(2));
    }

    #[tokio::test]
    async fn missing_file_is_an_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::load(&dir.path().join("absent.json")).await.unwrap();
        assert!(store.profiles().is_empty());
        assert_eq!(store.device_count(), 0);
    }

    #[tokio::test]
    async fn corrupt_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let err = DataStore::load(&path).await.err().unwrap();
        assert!(matches!(err, CoreError::Storage { .. }));
    }

    #[test]
    fn exhausted_id_space_is_rejected() {
        let store = DataStore::new();
        store
            .create_profile(NewProfile::new("lab", "10.0.0.1", "admin", "pw"))
            .unwrap();
        let mut state = store.to_state();
        state.profiles[0].id = ProfileId(u64::MAX);

        let err = DataStore::from_state(state).err().unwrap();
        assert!(
            matches!(err, CoreError::Validation { ref field, .. } if field == "profiles"),
            "{err}"
        );
    }

    #[test]
    fn orphan_devices_are_rejected() {
        let store = DataStore::new();
        let pid = store
            .create_profile(NewProfile::new("lab", "10.0.0.1", "admin", "pw"))
            .unwrap()
            .id;
        let mut state = store.to_state();
        state.profiles.clear();
        state.devices.push(Device {
            id: crate::model::DeviceId(1),
            router_profile_id: pid,
            native_id: "*1".into(),
            address: "8.8.8.8".into(),
            label: None,
            status: DeviceStatus::Up,
            since: Utc::now(),
            timeout: None,
            interval: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });

        assert!(matches!(
            DataStore::from_state(state),
            Err(CoreError::Validation { .. })
        ));
    }
}
