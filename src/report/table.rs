//! Summary table of a benchmark run.
//!
//! [`TableReport`] renders a slice of [`ScenarioResult`]s with the `tabled`
//! crate:
//!
//! ```text
//! ╭──────────────────────┬──────────┬───────┬──────────┬────────┬─────────────┬─────────────┬──────────╮
//! │ Scenario             │ Time (s) │ Value │ Expected │ Status │ Round trips │ CAS retries │ Incr/s   │
//! ├──────────────────────┼──────────┼───────┼──────────┼────────┼─────────────┼─────────────┼──────────┤
//! │ map/no-lock          │ 0.004    │ 1377  │ 4000     │ BAD    │ 8000        │ 0           │ 1006289  │
//! │ map/pessimistic-lock │ 0.011    │ 4000  │ 4000     │ OK     │ 16000       │ 0           │ 369318   │
//! ╰──────────────────────┴──────────┴───────┴──────────┴────────┴─────────────┴─────────────┴──────────╯
//! ```
//!
//! # Feature Flag
//!
//! This module requires the `table` feature.

use crate::scenario::ScenarioResult;
use tabled::{settings::Style, Table, Tabled};

/// Available table styles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableStyle {
    /// ASCII table with simple characters: +, -, |
    Ascii,
    /// Rounded corners (default)
    #[default]
    Rounded,
    /// Sharp corners with box-drawing characters
    Sharp,
    /// Modern style with clean lines
    Modern,
    /// GitHub-flavored Markdown table
    Markdown,
    /// No borders, just spacing
    Blank,
}

/// Configuration for [`TableReport`].
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// The style to use for rendering.
    pub style: TableStyle,
    /// Whether to show the header row.
    pub show_header: bool,
    /// Optional line printed above the table.
    pub title: Option<String>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            style: TableStyle::default(),
            show_header: true,
            title: None,
        }
    }
}

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "Scenario")]
    scenario: String,
    #[tabled(rename = "Time (s)")]
    time: String,
    #[tabled(rename = "Value")]
    value: i64,
    #[tabled(rename = "Expected")]
    expected: i64,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Round trips")]
    round_trips: u64,
    #[tabled(rename = "CAS retries")]
    cas_retries: u64,
    #[tabled(rename = "Incr/s")]
    throughput: String,
}

impl From<&ScenarioResult> for ResultRow {
    fn from(result: &ScenarioResult) -> Self {
        Self {
            scenario: result.scenario_name.clone(),
            time: format!("{:.3}", result.elapsed_seconds),
            value: result.observed_value,
            expected: result.expected_value,
            status: result.status(),
            round_trips: result.stats.round_trips,
            cas_retries: result.stats.cas_retries,
            throughput: format!("{:.0}", result.throughput()),
        }
    }
}

/// Renders results as a summary table.
///
/// # Examples
///
/// ```rust
/// use contesa::report::table::{TableReport, TableStyle};
/// use contesa::scenario::{run_timed, Observation};
///
/// let results = vec![run_timed("demo", 5, || Ok(Observation::value(5)))?];
/// let output = TableReport::new()
///     .with_style(TableStyle::Ascii)
///     .with_title("SUMMARY")
///     .render(&results);
///
/// assert!(output.starts_with("SUMMARY\n"));
/// assert!(output.contains("demo"));
/// # Ok::<(), contesa::error::BenchError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableReport {
    config: TableConfig,
}

impl TableReport {
    /// Creates a report with the rounded style and a header row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a report with the given configuration.
    pub fn with_config(config: TableConfig) -> Self {
        Self { config }
    }

    /// Sets the table style.
    pub fn with_style(mut self, style: TableStyle) -> Self {
        self.config.style = style;
        self
    }

    /// Sets whether to show the header row.
    pub fn with_header(mut self, show: bool) -> Self {
        self.config.show_header = show;
        self
    }

    /// Sets a title printed above the table.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    fn apply_style(&self, table: &mut Table) {
        match self.config.style {
            TableStyle::Ascii => {
                table.with(Style::ascii());
            }
            TableStyle::Rounded => {
                table.with(Style::rounded());
            }
            TableStyle::Sharp => {
                table.with(Style::sharp());
            }
            TableStyle::Modern => {
                table.with(Style::modern());
            }
            TableStyle::Markdown => {
                table.with(Style::markdown());
            }
            TableStyle::Blank => {
                table.with(Style::blank());
            }
        }
    }

    /// Renders `results` in order.
    pub fn render(&self, results: &[ScenarioResult]) -> String {
        let rows: Vec<ResultRow> = results.iter().map(ResultRow::from).collect();

        let mut table = Table::new(&rows);
        self.apply_style(&mut table);

        if !self.config.show_header {
            table.with(tabled::settings::Remove::row(
                tabled::settings::object::Rows::first(),
            ));
        }

        if let Some(ref title) = self.config.title {
            format!("{}\n{}", title, table)
        } else {
            table.to_string()
        }
    }
}
