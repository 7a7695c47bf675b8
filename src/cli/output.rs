//! Output formatting utilities for the CLI.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use serde::Serialize;
use std::env;

use crate::cli::commands::probe::ProbeResult;
use crate::domain::models::{RequestKey, RequestOutcome, RequestStats};

/// Result of a command, printable for humans or as JSON.
pub trait CommandOutput: Serialize {
    /// Plain-text rendering.
    fn to_human(&self) -> String;
    /// Machine-readable rendering.
    fn to_json(&self) -> serde_json::Value;
}

/// Print `result` on stdout in the selected mode.
pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// comfy-table rendering for probe results and request counters.
pub struct TableFormatter {
    use_colors: bool,
}

impl TableFormatter {
    /// Formatter that colours output when the terminal allows it.
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
        }
    }

    /// Formatter with colours forced on or off.
    pub const fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// One row per probed backend.
    pub fn format_probes(&self, results: &[ProbeResult]) -> String {
        let mut table = base_table();
        table.set_header(header(&["Backend", "Status", "Detail"]));

        for result in results {
            let status = if result.ok { "ok" } else { "failed" };
            let status_cell = if self.use_colors {
                Cell::new(status).fg(if result.ok { Color::Green } else { Color::Red })
            } else {
                Cell::new(status)
            };
            table.add_row(vec![
                Cell::new(result.backend.as_str()),
                status_cell,
                Cell::new(&result.detail),
            ]);
        }

        table.to_string()
    }

    /// One row per request key, with average latency.
    pub fn format_metrics(&self, entries: &[(RequestKey, RequestStats)]) -> String {
        let mut table = base_table();
        table.set_header(header(&["Method", "Endpoint", "Outcome", "Count", "Avg latency"]));

        for (key, stats) in entries {
            let average_ms = if stats.count == 0 {
                0.0
            } else {
                stats.total_latency.as_secs_f64() * 1000.0 / stats.count as f64
            };
            let outcome = key.outcome.to_string();
            let outcome_cell = match key.outcome {
                RequestOutcome::Status(code) if self.use_colors && (200..300).contains(&code) => {
                    Cell::new(outcome).fg(Color::Green)
                }
                _ if self.use_colors => Cell::new(outcome).fg(Color::Yellow),
                _ => Cell::new(outcome),
            };
            table.add_row(vec![
                Cell::new(key.method.as_str()),
                Cell::new(&key.endpoint),
                outcome_cell,
                Cell::new(stats.count),
                Cell::new(format!("{average_ms:.1} ms")),
            ]);
        }

        table.to_string()
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|title| Cell::new(title).add_attribute(Attribute::Bold))
        .collect()
}

fn supports_color() -> bool {
    if env::var_os("NO_COLOR").is_some() {
        return false;
    }
    env::var("TERM").map_or(true, |term| term != "dumb")
}
