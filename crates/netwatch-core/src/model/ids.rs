// ── Core identity types ──
//
// Local surrogate ids are numeric and assigned by the store. The
// router-native identifier is the durable key across polls.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

// ── ProfileId ───────────────────────────────────────────────────────

/// Locally assigned identifier of a router profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub u64);

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProfileId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u64> for ProfileId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

// ── DeviceId ────────────────────────────────────────────────────────

/// Locally assigned surrogate id of a device row. Stable for the life of
/// the row, but never used to match snapshot entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub u64);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DeviceId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u64> for DeviceId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

// ── NativeId ────────────────────────────────────────────────────────

/// Router-assigned identifier of a monitored host (RouterOS uses `*1`,
/// `*2`, ...). Surrounding whitespace is stripped; otherwise opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct NativeId(String);

impl NativeId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NativeId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<String> for NativeId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for NativeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<NativeId> for String {
    fn from(id: NativeId) -> Self {
        id.0
    }
}

// ── DeviceKey ───────────────────────────────────────────────────────

/// Composite identity of a device row: one row per router profile and
/// native identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceKey {
    pub profile_id: ProfileId,
    pub native_id: NativeId,
}

impl DeviceKey {
    pub fn new(profile_id: ProfileId, native_id: NativeId) -> Self {
        Self {
            profile_id,
            native_id,
        }
    }
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.profile_id, self.native_id)
    }
}
