// ── Summary calculation ──

use std::sync::Arc;

use super::DataStore;
use crate::error::CoreError;
use crate::model::{ProfileId, Summary};

impl DataStore {
    /// Aggregate counts for one profile, recomputed from live state on
    /// every call.
    pub fn summarize(&self, profile_id: ProfileId) -> Result<Summary, CoreError> {
        self.profile(profile_id)?;
        let snapshot = self.devices.snapshot();
        Ok(Summary::from_devices(
            snapshot
                .iter()
                .filter(|d| d.router_profile_id == profile_id)
                .map(Arc::as_ref),
        ))
    }
}
