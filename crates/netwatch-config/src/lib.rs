//! Shared configuration for the netwatch CLI.
//!
//! A single TOML file layered with `NETWATCH_*` environment variables, plus
//! resolution of the platform paths used for the state file and router
//! exports, and translation to `netwatch_core::MonitorConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use netwatch_core::MonitorConfig;

/// Values accepted for `defaults.output`.
pub const OUTPUT_FORMATS: &[&str] = &["table", "json", "json-compact", "yaml", "plain"];

/// Values accepted for `defaults.color`.
pub const COLOR_MODES: &[&str] = &["auto", "always", "never"];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Override for the state file location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_path: Option<PathBuf>,

    /// Override for the directory holding `<address>.json` router exports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Upper bound on one router fetch, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Seconds between polls for `watch`.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    10
}
fn default_poll_interval() -> u64 {
    5
}

impl Config {
    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.defaults;
        if !OUTPUT_FORMATS.contains(&d.output.as_str()) {
            return Err(ConfigError::Validation {
                field: "defaults.output".into(),
                reason: format!("expected one of {}, got '{}'", OUTPUT_FORMATS.join(", "), d.output),
            });
        }
        if !COLOR_MODES.contains(&d.color.as_str()) {
            return Err(ConfigError::Validation {
                field: "defaults.color".into(),
                reason: format!("expected one of {}, got '{}'", COLOR_MODES.join(", "), d.color),
            });
        }
        if d.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "defaults.timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        if d.poll_interval == 0 {
            return Err(ConfigError::Validation {
                field: "defaults.poll_interval".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        Ok(())
    }

    /// Effective state file path.
    pub fn state_path(&self) -> PathBuf {
        self.state_path
            .clone()
            .unwrap_or_else(|| data_dir().join("state.json"))
    }

    /// Effective router export directory.
    pub fn source_dir(&self) -> PathBuf {
        self.source_dir
            .clone()
            .unwrap_or_else(|| data_dir().join("routers"))
    }

    pub fn to_monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            fetch_timeout: Duration::from_secs(self.defaults.timeout),
            poll_interval: Duration::from_secs(self.defaults.poll_interval),
        }
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "netwatch", "netwatch")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory for the state file and router exports.
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".local/share"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

fn dirs_fallback(base: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(base);
    p.push("netwatch");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file contributes nothing.
///
/// Nested keys use a double underscore: `NETWATCH_DEFAULTS__TIMEOUT=3`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("NETWATCH_").split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    cfg.validate()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.defaults, Defaults::default());
        assert_eq!(cfg.to_monitor_config(), MonitorConfig::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "state_path = \"/srv/netwatch/state.json\"\n\
             [defaults]\noutput = \"yaml\"\npoll_interval = 30\n",
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();

        assert_eq!(cfg.defaults.output, "yaml");
        assert_eq!(cfg.defaults.timeout, 10);
        assert_eq!(cfg.defaults.poll_interval, 30);
        assert_eq!(cfg.state_path(), PathBuf::from("/srv/netwatch/state.json"));
        assert_eq!(
            cfg.to_monitor_config().poll_interval,
            Duration::from_secs(30)
        );
    }

    #[test]
    fn invalid_values_name_the_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[defaults]\noutput = \"xml\"\n").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("defaults.output"), "{err}");
    }

    #[test]
    fn save_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.defaults.timeout = 3;
        cfg.source_dir = Some(dir.path().join("routers"));

        save_config_to(&cfg, &path).unwrap();

        assert_eq!(load_config_from(&path).unwrap(), cfg);
    }

    #[test]
    fn zero_timeout_is_rejected_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = Config::default();
        cfg.defaults.timeout = 0;
        assert!(matches!(
            save_config_to(&cfg, &dir.path().join("config.toml")),
            Err(ConfigError::Validation { .. })
        ));
    }
}
