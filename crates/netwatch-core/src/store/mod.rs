// ── Storage layer ──
//
// In-memory tables for router profiles and monitored devices, plus the
// reconciliation, query and summary logic that runs over them.

mod collection;
mod data_store;
mod persist;
mod profiles;
mod query;
mod reconcile;
mod summary;

pub use data_store::DataStore;
pub use persist::{PersistedState, StoredProfile};
pub use query::{DeviceQuery, StatusFilter};
