//! Config subcommand handlers.

use dialoguer::{Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, COLOR_MODES, Config, OUTPUT_FORMATS};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, including the effective paths.
fn format_config(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    let _ = writeln!(out, "state_path = \"{}\"", cfg.state_path().display());
    let _ = writeln!(out, "source_dir = \"{}\"", cfg.source_dir().display());
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = write!(out, "poll_interval = {}", cfg.defaults.poll_interval);

    out
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn select_from(prompt: &str, choices: &[&str], current: &str) -> Result<String, CliError> {
    let default = choices.iter().position(|c| *c == current).unwrap_or(0);
    let picked = Select::new()
        .with_prompt(prompt)
        .items(choices)
        .default(default)
        .interact()
        .map_err(prompt_err)?;
    Ok(choices.get(picked).copied().unwrap_or(current).to_owned())
}

fn seconds(prompt: &str, current: u64) -> Result<u64, CliError> {
    Input::new()
        .with_prompt(prompt)
        .default(current)
        .validate_with(|v: &u64| if *v == 0 { Err("must be at least 1") } else { Ok(()) })
        .interact_text()
        .map_err(prompt_err)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &mut GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: guided setup ──────────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            let mut cfg = Config::default();

            if !global.yes {
                eprintln!("✨ netwatch configuration wizard");
                eprintln!("   Config path: {}\n", config_path.display());

                cfg.defaults.output =
                    select_from("Default output format", OUTPUT_FORMATS, &cfg.defaults.output)?;
                cfg.defaults.color = select_from("Color output", COLOR_MODES, &cfg.defaults.color)?;
                cfg.defaults.timeout = seconds("Router timeout (seconds)", cfg.defaults.timeout)?;
                cfg.defaults.poll_interval =
                    seconds("Watch poll interval (seconds)", cfg.defaults.poll_interval)?;
            }

            let path = config::save_config(&cfg)?;
            std::fs::create_dir_all(cfg.source_dir())?;

            if !global.quiet {
                eprintln!("✓ Configuration written to {}", path.display());
                eprintln!("  Router exports go in {}", cfg.source_dir().display());
            }
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::resolve(global)?;
            let out =
                output::render_single(&global.output(), &cfg, format_config, |_| "config".into())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}
