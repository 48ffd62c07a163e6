// ── Domain model ──

pub mod device;
pub mod ids;
pub mod profile;
pub mod summary;

pub use device::{Device, DeviceStatus, SnapshotDevice};
pub use ids::{DeviceId, DeviceKey, NativeId, ProfileId};
pub use profile::{NewProfile, ProfilePatch, RouterProfile};
pub use summary::Summary;
