//! CLI configuration: a thin wrapper around `netwatch_config` shared types.
//!
//! Layers `GlobalOpts` flag overrides (--output, --timeout, --state, ...)
//! on top of the loaded file + environment configuration.

use clap::ValueEnum;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use netwatch_config::{
    COLOR_MODES, Config, OUTPUT_FORMATS, config_path, load_config, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Load the config and fold CLI flags into it.
///
/// Flags win over the file; the file's `defaults.output` and
/// `defaults.color` fill in whatever the flags left unset.
pub fn resolve(global: &mut GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = load_config()?;
    apply_overrides(&mut cfg, global)?;
    Ok(cfg)
}

fn apply_overrides(cfg: &mut Config, global: &mut GlobalOpts) -> Result<(), CliError> {
    if global.output.is_none() {
        global.output = OutputFormat::from_str(&cfg.defaults.output, true).ok();
    }
    if global.color.is_none() {
        global.color = ColorMode::from_str(&cfg.defaults.color, true).ok();
    }
    if let Some(timeout) = global.timeout {
        if timeout == 0 {
            return Err(CliError::Validation {
                field: "timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        cfg.defaults.timeout = timeout;
    }
    if let Some(ref state) = global.state {
        cfg.state_path = Some(state.clone());
    }
    if let Some(ref dir) = global.source_dir {
        cfg.source_dir = Some(dir.clone());
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn flags_override_file_values() {
        let mut cli = Cli::parse_from([
            "netwatch",
            "--timeout",
            "3",
            "--state",
            "/tmp/nw.json",
            "summary",
            "1",
        ]);
        let mut cfg = Config::default();
        cfg.defaults.output = "yaml".into();

        apply_overrides(&mut cfg, &mut cli.global).unwrap();

        assert_eq!(cli.global.output(), OutputFormat::Yaml);
        assert_eq!(cfg.defaults.timeout, 3);
        assert_eq!(cfg.state_path(), std::path::PathBuf::from("/tmp/nw.json"));
    }

    #[test]
    fn zero_timeout_flag_is_rejected() {
        let mut cli = Cli::parse_from(["netwatch", "--timeout", "0", "summary", "1"]);
        let mut cfg = Config::default();
        assert!(matches!(
            apply_overrides(&mut cfg, &mut cli.global),
            Err(CliError::Validation { .. })
        ));
    }
}
