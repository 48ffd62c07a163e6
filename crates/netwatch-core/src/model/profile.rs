// ── Router profile domain types ──

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Serialize;

use super::ids::ProfileId;
use crate::error::CoreError;

/// A saved router connection profile.
///
/// The secret is never serialized; structured output (JSON/YAML) shows
/// everything else.
#[derive(Debug, Clone, Serialize)]
pub struct RouterProfile {
    pub id: ProfileId,
    pub name: String,
    pub address: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub secret: SecretString,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a profile.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub name: String,
    pub address: String,
    pub username: String,
    pub secret: SecretString,
    pub is_active: bool,
}

impl NewProfile {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            username: username.into(),
            secret: SecretString::from(secret.into()),
            is_active: false,
        }
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), CoreError> {
        require_non_empty("name", &self.name)?;
        require_non_empty("address", &self.address)?;
        require_non_empty("username", &self.username)?;
        require_secret(&self.secret)
    }
}

/// Partial update of a profile. `None` leaves the field as it is.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub username: Option<String>,
    pub secret: Option<SecretString>,
    pub is_active: Option<bool>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.address.is_none()
            && self.username.is_none()
            && self.secret.is_none()
            && self.is_active.is_none()
    }

    pub(crate) fn validate(&self) -> Result<(), CoreError> {
        if let Some(ref name) = self.name {
            require_non_empty("name", name)?;
        }
        if let Some(ref address) = self.address {
            require_non_empty("address", address)?;
        }
        if let Some(ref username) = self.username {
            require_non_empty("username", username)?;
        }
        if let Some(ref secret) = self.secret {
            require_secret(secret)?;
        }
        Ok(())
    }

    /// Merge onto `current`. `updated_at` is refreshed even for an empty
    /// patch.
    pub(crate) fn apply(self, current: &RouterProfile, now: DateTime<Utc>) -> RouterProfile {
        RouterProfile {
            id: current.id,
            name: self.name.unwrap_or_else(|| current.name.clone()),
            address: self.address.unwrap_or_else(|| current.address.clone()),
            username: self.username.unwrap_or_else(|| current.username.clone()),
            secret: self.secret.unwrap_or_else(|| current.secret.clone()),
            is_active: self.is_active.unwrap_or(current.is_active),
            created_at: current.created_at,
            updated_at: now,
        }
    }
}

pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation {
            field: field.into(),
            reason: "must not be empty".into(),
        });
    }
    Ok(())
}

fn require_secret(secret: &SecretString) -> Result<(), CoreError> {
    use secrecy::ExposeSecret;

    if secret.expose_secret().is_empty() {
        return Err(CoreError::Validation {
            field: "secret".into(),
            reason: "must not be empty".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn sample(now: DateTime<Utc>) -> RouterProfile {
        RouterProfile {
            id: ProfileId(1),
            name: "office".into(),
            address: "192.168.88.1".into(),
            username: "admin".into(),
            secret: SecretString::from("hunter2".to_string()),
            is_active: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn new_profile_rejects_blank_fields() {
        let err = NewProfile::new("office", " ", "admin", "pw")
            .validate()
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { ref field, .. } if field == "address"));

        let err = NewProfile::new("office", "10.0.0.1", "admin", "")
            .validate()
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { ref field, .. } if field == "secret"));
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let now = Utc::now();
        let current = sample(now);
        let later = now + chrono::Duration::seconds(5);

        let patch = ProfilePatch {
            name: Some("branch".into()),
            is_active: Some(true),
            ..ProfilePatch::default()
        };
        let merged = patch.apply(&current, later);

        assert_eq!(merged.name, "branch");
        assert!(merged.is_active);
        assert_eq!(merged.address, "192.168.88.1");
        assert_eq!(merged.secret.expose_secret(), "hunter2");
        assert_eq!(merged.created_at, now);
        assert_eq!(merged.updated_at, later);
    }

    #[test]
    fn patch_rejects_present_but_empty_values() {
        let patch = ProfilePatch {
            username: Some(String::new()),
            ..ProfilePatch::default()
        };
        assert!(patch.validate().is_err());
        assert!(ProfilePatch::default().validate().is_ok());
        assert!(ProfilePatch::default().is_empty());
    }

    #[test]
    fn secret_is_not_serialized() {
        let json = serde_json::to_string(&sample(Utc::now())).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(json.contains("\"username\":\"admin\""));
    }
}
