// ── Runtime connection configuration ──
//
// These types describe *how* to reach a router and how often to poll it.
// They carry credential data and tuning, but never touch disk. The CLI
// builds a `MonitorConfig` and hands it in.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::CoreError;
use crate::model::RouterProfile;
use crate::model::profile::require_non_empty;

/// Credentials for a single router.
#[derive(Debug, Clone)]
pub struct RouterConnection {
    pub address: String,
    pub username: String,
    pub secret: SecretString,
}

impl RouterConnection {
    pub fn new(
        address: impl Into<String>,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            username: username.into(),
            secret: SecretString::from(secret.into()),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        require_non_empty("address", &self.address)?;
        require_non_empty("username", &self.username)?;
        if self.secret.expose_secret().is_empty() {
            return Err(CoreError::Validation {
                field: "secret".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Whether these credentials are the ones stored in `profile`.
    pub fn matches(&self, profile: &RouterProfile) -> bool {
        self.address == profile.address
            && self.username == profile.username
            && self.secret.expose_secret() == profile.secret.expose_secret()
    }
}

impl From<&RouterProfile> for RouterConnection {
    fn from(profile: &RouterProfile) -> Self {
        Self {
            address: profile.address.clone(),
            username: profile.username.clone(),
            secret: profile.secret.clone(),
        }
    }
}

/// Tuning for a [`Monitor`](crate::Monitor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Upper bound on a single snapshot fetch or identity probe.
    pub fetch_timeout: Duration,
    /// Default period between polls for spawned pollers.
    pub poll_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(5),
        }
    }
}
