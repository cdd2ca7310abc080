//! Output formatting: table or JSON.
//!
//! Table uses `tabled`, structured formats serialize the core types
//! directly via serde.

use std::io::{self, IsTerminal, Write};

use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Render `data` as a table of rows or as JSON.
pub fn render<T, R>(
    format: OutputFormat,
    data: &T,
    rows: impl FnOnce(&T) -> Vec<R>,
) -> Result<String, CliError>
where
    T: serde::Serialize + ?Sized,
    R: Tabled,
{
    Ok(match format {
        OutputFormat::Table => render_table(&rows(data)),
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
    })
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

fn render_table<R: Tabled>(rows: &[R]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}
