//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use netwatch_core::DeviceStatus;

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Status word, green for up and red for down when color is on.
pub fn status_label(status: DeviceStatus, color: bool) -> String {
    match (status, color) {
        (DeviceStatus::Up, true) => status.green().to_string(),
        (DeviceStatus::Down, true) => status.red().to_string(),
        (_, false) => status.to_string(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(data.iter().map(&id_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses a custom `detail_fn` that returns a pre-formatted string,
/// since single-item detail views don't use `Tabled` derive.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(id_fn(data)),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.map_err(|e| CliError::Render(e.to_string()))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data).map_err(|e| CliError::Render(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(serde::Serialize)]
    struct Item {
        id: u64,
        name: &'static str,
    }

    #[derive(Tabled)]
    struct ItemRow {
        #[tabled(rename = "ID")]
        id: u64,
        #[tabled(rename = "Name")]
        name: &'static str,
    }

    fn items() -> Vec<Item> {
        vec![Item { id: 1, name: "core" }, Item { id: 2, name: "edge" }]
    }

    fn row(i: &Item) -> ItemRow {
        ItemRow {
            id: i.id,
            name: i.name,
        }
    }

    #[test]
    fn plain_emits_one_id_per_line() {
        let out = render_list(&OutputFormat::Plain, &items(), row, |i| i.id.to_string()).unwrap();
        assert_eq!(out, "1\n2");
    }

    #[test]
    fn compact_json_is_single_line() {
        let out =
            render_list(&OutputFormat::JsonCompact, &items(), row, |i| i.id.to_string()).unwrap();
        assert_eq!(out, r#"[{"id":1,"name":"core"},{"id":2,"name":"edge"}]"#);
    }

    #[test]
    fn table_has_headers() {
        let out = render_list(&OutputFormat::Table, &items(), row, |i| i.id.to_string()).unwrap();
        assert!(out.contains("Name"));
        assert!(out.contains("edge"));
    }

    #[test]
    fn status_is_plain_without_color() {
        assert_eq!(status_label(DeviceStatus::Down, false), "down");
        assert!(status_label(DeviceStatus::Up, true).contains("up"));
    }
}
