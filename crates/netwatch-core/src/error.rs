// ── Core error types ──
//
// User-facing errors from netwatch-core. Snapshot sources report
// `ConnectionError`; everything else is expressed as a `CoreError`
// variant carrying the id or address involved.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::{DeviceId, ProfileId};

/// Failure to obtain data from a router.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("Router at {address} is unreachable: {reason}")]
    Unreachable { address: String, reason: String },

    #[error("Authentication rejected by router at {address}")]
    AuthFailed { address: String },

    #[error("Router at {address} did not answer within {timeout_secs}s")]
    Timeout { address: String, timeout_secs: u64 },

    #[error("Unexpected response from router at {address}: {reason}")]
    Protocol { address: String, reason: String },
}

impl ConnectionError {
    /// Whether retrying the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unreachable { .. } | Self::Timeout { .. })
    }

    pub fn address(&self) -> &str {
        match self {
            Self::Unreachable { address, .. }
            | Self::AuthFailed { address }
            | Self::Timeout { address, .. }
            | Self::Protocol { address, .. } => address,
        }
    }
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity} not found: {identifier}")]
    NotFound {
        entity: &'static str,
        identifier: String,
    },

    #[error(
        "Router profile {profile_id} is still referenced by {device_count} device(s) and cannot be deleted"
    )]
    Conflict {
        profile_id: ProfileId,
        device_count: usize,
    },

    // ── Connection errors ────────────────────────────────────────────
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    // ── Input errors ─────────────────────────────────────────────────
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    // ── Persistence errors ───────────────────────────────────────────
    #[error("State file {}: {reason}", path.display())]
    Storage { path: PathBuf, reason: String },
}

impl CoreError {
    pub(crate) fn profile_not_found(id: ProfileId) -> Self {
        Self::NotFound {
            entity: "router profile",
            identifier: id.to_string(),
        }
    }

    pub(crate) fn device_not_found(id: DeviceId) -> Self {
        Self::NotFound {
            entity: "device",
            identifier: id.to_string(),
        }
    }

    /// Whether the failed operation may succeed if simply retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(e) => e.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_and_unreachable_are_retryable() {
        let timeout = ConnectionError::Timeout {
            address: "10.0.0.1".into(),
            timeout_secs: 5,
        };
        let auth = ConnectionError::AuthFailed {
            address: "10.0.0.1".into(),
        };
        assert!(timeout.is_retryable());
        assert!(!auth.is_retryable());
        assert!(CoreError::from(timeout).is_retryable());
        assert!(!CoreError::profile_not_found(ProfileId(1)).is_retryable());
    }

    #[test]
    fn conflict_names_the_blocking_device_count() {
        let err = CoreError::Conflict {
            profile_id: ProfileId(4),
            device_count: 3,
        };
        assert!(err.to_string().contains("3 device(s)"));
    }
}
