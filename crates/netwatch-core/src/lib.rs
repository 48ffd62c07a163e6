//! Device-status reconciliation engine for router netwatch monitoring.
//!
//! A router exposes a table of monitored hosts, each with an up/down state.
//! This crate polls those tables, merges every snapshot into a persistent
//! per-profile device table and derives aggregate counts:
//!
//! - **[`Monitor`]**: Facade tying a [`SnapshotSource`] to a
//!   [`DataStore`]. [`sync()`](Monitor::sync) runs one fetch → reconcile →
//!   summarize pass; [`spawn_poller()`](Monitor::spawn_poller) repeats it
//!   in the background until cancelled.
//!
//! - **[`DataStore`]**: Lock-free storage built on `DashMap` plus
//!   `tokio::sync::watch` snapshots. Holds router profiles and devices keyed
//!   by `(profile, native id)`, and round-trips through a JSON state file.
//!
//! - **[`SnapshotSource`]**: Pluggable access to a router's netwatch
//!   table. [`MemorySource`] serves fixtures; [`FileSource`] reads exported
//!   JSON files.
//!
//! - **Domain model** ([`model`]): [`RouterProfile`], [`Device`],
//!   [`SnapshotDevice`] and the derived [`Summary`].

pub mod config;
pub mod error;
pub mod model;
pub mod monitor;
pub mod source;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{MonitorConfig, RouterConnection};
pub use error::{ConnectionError, CoreError};
pub use monitor::{ConnectionResult, Monitor, PollOutcome, PollerHandle, SyncReport};
pub use source::{FileSource, MemorySource, RouterExport, SnapshotSource};
pub use store::{DataStore, DeviceQuery, PersistedState, StatusFilter, StoredProfile};

pub use model::{
    Device, DeviceId, DeviceKey, DeviceStatus, NativeId, NewProfile, ProfileId, ProfilePatch,
    RouterProfile, SnapshotDevice, Summary,
};
