// ── Router profile CRUD ──

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::DataStore;
use crate::config::RouterConnection;
use crate::error::CoreError;
use crate::model::{NewProfile, ProfileId, ProfilePatch, RouterProfile};

impl DataStore {
    /// Create a profile, assigning its id and timestamps.
    pub fn create_profile(&self, new: NewProfile) -> Result<Arc<RouterProfile>, CoreError> {
        new.validate()?;

        let now = Utc::now();
        let profile = RouterProfile {
            id: self.allocate_profile_id(),
            name: new.name,
            address: new.address,
            username: new.username,
            secret: new.secret,
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        };
        let id = profile.id;
        self.profiles.insert(id, profile);
        info!(profile_id = %id, "router profile created");

        self.profile(id)
    }

    /// All profiles, most recently updated first.
    pub fn profiles(&self) -> Vec<Arc<RouterProfile>> {
        let mut all: Vec<_> = self.profiles.snapshot().iter().cloned().collect();
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        all
    }

    pub fn profile(&self, id: ProfileId) -> Result<Arc<RouterProfile>, CoreError> {
        self.profiles
            .get_by_key(&id)
            .ok_or_else(|| CoreError::profile_not_found(id))
    }

    /// Apply a partial update. Only fields present in `patch` change;
    /// `updated_at` is always refreshed.
    pub fn update_profile(
        &self,
        id: ProfileId,
        patch: ProfilePatch,
    ) -> Result<Arc<RouterProfile>, CoreError> {
        patch.validate()?;
        let now = Utc::now();
        let updated = self
            .profiles
            .update_with(&id, |current| patch.apply(current, now))
            .ok_or_else(|| CoreError::profile_not_found(id))?;
        debug!(profile_id = %id, "router profile updated");
        Ok(updated)
    }

    /// Delete a profile. Refused while any device still references it.
    pub async fn delete_profile(&self, id: ProfileId) -> Result<(), CoreError> {
        let guard = self.lock_profile(id).await;

        if self.profiles.get_by_key(&id).is_none() {
            drop(guard);
            self.forget_profile_lock(id);
            return Err(CoreError::profile_not_found(id));
        }

        let device_count = self.device_count_for(id);
        if device_count > 0 {
            return Err(CoreError::Conflict {
                profile_id: id,
                device_count,
            });
        }

        self.profiles.remove(&id);
        drop(guard);
        self.forget_profile_lock(id);
        info!(profile_id = %id, "router profile deleted");
        Ok(())
    }

    /// Find the profile whose stored credentials match `connection`.
    pub fn find_profile_by_connection(
        &self,
        connection: &RouterConnection,
    ) -> Option<Arc<RouterProfile>> {
        self.profiles
            .snapshot()
            .iter()
            .find(|p| connection.matches(p))
            .cloned()
    }
}
