//! Output helpers shared by the commands.

use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};
use console::{style, StyledObject};
use serde::Serialize;

/// Types that render as human-readable text or JSON.
pub trait CommandOutput: Serialize {
    /// Render for a terminal.
    fn to_human(&self) -> String;
    /// Render as JSON.
    fn to_json(&self) -> serde_json::Value;
}

/// Print `result` according to the JSON flag.
pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&result.to_json()).unwrap_or_default()
        );
    } else {
        println!("{}", result.to_human());
    }
}

/// Borderless table with upper-cased headers.
pub fn list_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h.to_uppercase()).set_alignment(CellAlignment::Left)),
        );
    table
}

/// Colour a reliability level label.
pub fn colorize_level(level: &str) -> StyledObject<&str> {
    match level {
        "high" | "trusted" => style(level).green().bold(),
        "medium" | "needs_review" => style(level).yellow(),
        "low" | "discard" => style(level).red(),
        _ => style(level).dim(),
    }
}

/// Colour a runner status label.
pub fn colorize_status(status: &str) -> StyledObject<&str> {
    match status {
        "passed" => style(status).green(),
        "failed" | "error" => style(status).red(),
        _ => style(status).yellow(),
    }
}

/// Percentage, or `n/a` for a missing/sentinel value.
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() && v >= 0.0 => format!("{v:.1}%"),
        _ => "n/a".to_string(),
    }
}
