// ── Aggregate status counts ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::device::Device;

/// Up/down/total counts for one router profile. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_devices: usize,
    pub up_devices: usize,
    pub down_devices: usize,
    /// Latest `updated_at` across the counted devices, or the time of the
    /// computation when there are none.
    pub last_updated: DateTime<Utc>,
}

impl Summary {
    pub fn from_devices<'a>(devices: impl IntoIterator<Item = &'a Device>) -> Self {
        let mut up = 0;
        let mut down = 0;
        let mut last_updated: Option<DateTime<Utc>> = None;

        for device in devices {
            if device.status.is_up() {
                up += 1;
            } else {
                down += 1;
            }
            last_updated = Some(last_updated.map_or(device.updated_at, |t| t.max(device.updated_at)));
        }

        Self {
            total_devices: up + down,
            up_devices: up,
            down_devices: down,
            last_updated: last_updated.unwrap_or_else(Utc::now),
        }
    }
}
