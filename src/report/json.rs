//! JSON report of a benchmark run.
//!
//! # Feature Flag
//!
//! This module requires the `json` feature.
//!
//! # Examples
//!
//! ```rust
//! use contesa::report::json::JsonReport;
//! use contesa::scenario::{run_timed, Observation};
//! use contesa::settings::Settings;
//!
//! let settings = Settings::new(1, 5);
//! let results = vec![run_timed("demo", 5, || Ok(Observation::value(5)))?];
//!
//! let json = JsonReport::new().to_json(&settings, &results).unwrap();
//! assert!(json.contains(r#""scenario_name":"demo""#));
//! # Ok::<(), contesa::error::BenchError>(())
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::scenario::ScenarioResult;
use crate::settings::Settings;

/// Everything one run produced, ready to serialize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunReport {
    /// Milliseconds since the Unix epoch when the report was built.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,
    /// The settings shared by every scenario.
    pub settings: Settings,
    /// One entry per scenario, in run order.
    pub results: Vec<ScenarioResult>,
}

impl RunReport {
    /// Creates a report without a timestamp.
    pub fn new(settings: Settings, results: Vec<ScenarioResult>) -> Self {
        Self {
            timestamp_ms: None,
            settings,
            results,
        }
    }

    /// Finds a scenario's result by name.
    pub fn get(&self, name: &str) -> Option<&ScenarioResult> {
        self.results.iter().find(|r| r.scenario_name == name)
    }
}

/// Configuration for [`JsonReport`].
#[derive(Debug, Clone, Default)]
pub struct JsonConfig {
    /// Whether to pretty-print the output.
    pub pretty: bool,
    /// Whether to stamp the report with the current time.
    pub include_timestamp: bool,
}

/// Serializes runs to JSON.
#[derive(Debug, Clone, Default)]
pub struct JsonReport {
    config: JsonConfig,
}

impl JsonReport {
    /// Creates a compact, untimestamped report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a report with the given configuration.
    pub fn with_config(config: JsonConfig) -> Self {
        Self { config }
    }

    /// Enables or disables pretty-printing.
    pub fn pretty(mut self, enabled: bool) -> Self {
        self.config.pretty = enabled;
        self
    }

    /// Enables or disables the timestamp.
    pub fn include_timestamp(mut self, enabled: bool) -> Self {
        self.config.include_timestamp = enabled;
        self
    }

    /// Builds the intermediate [`RunReport`].
    pub fn collect(&self, settings: &Settings, results: &[ScenarioResult]) -> RunReport {
        let mut report = RunReport::new(settings.clone(), results.to_vec());
        if self.config.include_timestamp {
            report.timestamp_ms = Some(current_timestamp_ms());
        }
        report
    }

    /// Serializes settings and results to a JSON string.
    pub fn to_json(
        &self,
        settings: &Settings,
        results: &[ScenarioResult],
    ) -> Result<String, serde_json::Error> {
        let report = self.collect(settings, results);
        if self.config.pretty {
            serde_json::to_string_pretty(&report)
        } else {
            serde_json::to_string(&report)
        }
    }
}

fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
