// ── Snapshot sources ──
//
// A snapshot source is whatever can answer "which hosts is this router
// watching right now". The monitor only sees this trait; protocol details
// live behind it.

mod file;
mod memory;

use std::future::Future;

use crate::config::RouterConnection;
use crate::error::ConnectionError;
use crate::model::SnapshotDevice;

pub use file::{FileSource, RouterExport};
pub use memory::MemorySource;

/// Point-in-time access to a router's monitored hosts.
///
/// Implementations must not retry on their own; the caller bounds every
/// call with a timeout and decides whether to try again.
pub trait SnapshotSource: Send + Sync {
    /// Fetch the router's current list of monitored hosts.
    fn fetch_snapshot(
        &self,
        connection: &RouterConnection,
    ) -> impl Future<Output = Result<Vec<SnapshotDevice>, ConnectionError>> + Send;

    /// Authenticate and return the router's identity string.
    fn identify(
        &self,
        connection: &RouterConnection,
    ) -> impl Future<Output = Result<String, ConnectionError>> + Send;
}
