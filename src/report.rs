//! Rendering scenario results.
//!
//! - [`format_line`] - one console line per scenario, printed as it finishes
//! - [`table`] - a summary table of the whole run using the `tabled` crate
//! - [`json`] - the whole run as JSON
//!
//! # Feature Flags
//!
//! - `table` - Enables the [`table`] module
//! - `json` - Enables the [`json`] module
//! - `full` - Enables both

use crate::scenario::ScenarioResult;

#[cfg(feature = "table")]
pub mod table;

#[cfg(feature = "json")]
pub mod json;

/// Formats a result as
/// `name  time=   0.123s  value=4000  expected=4000  => OK`.
///
/// # Examples
///
/// ```rust
/// use contesa::report::format_line;
/// use contesa::scenario::{run_timed, Observation};
///
/// let result = run_timed("demo", 3, || Ok(Observation::value(2)))?;
/// let line = format_line(&result);
/// assert!(line.starts_with("demo"));
/// assert!(line.ends_with("value=2  expected=3  => BAD"));
/// # Ok::<(), contesa::error::BenchError>(())
/// ```
pub fn format_line(result: &ScenarioResult) -> String {
    format!(
        "{:<38} time={:>8.3}s  value={}  expected={}  => {}",
        result.scenario_name,
        result.elapsed_seconds,
        result.observed_value,
        result.expected_value,
        result.status()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tally::StatsSnapshot;

    #[test]
    fn test_format_line() {
        let result = ScenarioResult {
            scenario_name: "map/optimistic-cas".into(),
            elapsed_seconds: 1.23456,
            observed_value: 4000,
            expected_value: 4000,
            passed: true,
            stats: StatsSnapshot::default(),
        };
        let line = format_line(&result);
        assert!(line.starts_with("map/optimistic-cas "));
        assert!(line.contains("time=   1.235s"));
        assert!(line.ends_with("value=4000  expected=4000  => OK"));
    }
}
