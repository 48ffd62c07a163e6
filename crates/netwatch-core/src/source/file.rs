// ── File-backed snapshot source ──
//
// Reads router exports from `<dir>/<address>.json`. An export is the
// router identity, optional expected credentials and the netwatch table:
//
//   { "identity": "core-rtr", "username": "admin", "secret": "…",
//     "netwatch": [ { ".id": "*1", "host": "8.8.8.8", "status": "up", … } ] }

use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::SnapshotSource;
use crate::config::RouterConnection;
use crate::error::ConnectionError;
use crate::model::SnapshotDevice;

/// On-disk router export consumed by [`FileSource`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouterExport {
    pub identity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default)]
    pub netwatch: Vec<SnapshotDevice>,
}

/// Snapshot source reading one JSON export per router address.
#[derive(Debug, Clone)]
pub struct FileSource {
    dir: PathBuf,
}

impl FileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the export for `address` is expected.
    pub fn export_path(&self, address: &str) -> PathBuf {
        self.dir.join(format!("{address}.json"))
    }

    async fn read_export(
        &self,
        connection: &RouterConnection,
    ) -> Result<RouterExport, ConnectionError> {
        let address = connection.address.as_str();
        if address.is_empty()
            || address.contains(['/', '\\'])
            || address.contains("..")
        {
            return Err(ConnectionError::Unreachable {
                address: address.to_owned(),
                reason: "address is not a valid export name".into(),
            });
        }

        let path = self.export_path(address);
        let raw = tokio::fs::read_to_string(&path).await.map_err(|e| {
            let reason = if e.kind() == std::io::ErrorKind::NotFound {
                format!("no export at {}", path.display())
            } else {
                format!("{}: {e}", path.display())
            };
            ConnectionError::Unreachable {
                address: address.to_owned(),
                reason,
            }
        })?;

        let export: RouterExport =
            serde_json::from_str(&raw).map_err(|e| ConnectionError::Protocol {
                address: address.to_owned(),
                reason: e.to_string(),
            })?;

        let user_ok = export
            .username
            .as_deref()
            .is_none_or(|u| u == connection.username);
        let secret_ok = export
            .secret
            .as_deref()
            .is_none_or(|s| s == connection.secret.expose_secret());
        if !(user_ok && secret_ok) {
            return Err(ConnectionError::AuthFailed {
                address: address.to_owned(),
            });
        }

        debug!(path = %path.display(), hosts = export.netwatch.len(), "router export read");
        Ok(export)
    }
}

impl SnapshotSource for FileSource {
    async fn fetch_snapshot(
        &self,
        connection: &RouterConnection,
    ) -> Result<Vec<SnapshotDevice>, ConnectionError> {
        Ok(self.read_export(connection).await?.netwatch)
    }

    async fn identify(&self, connection: &RouterConnection) -> Result<String, ConnectionError> {
        Ok(self.read_export(connection).await?.identity)
    }
}
