//! Error and metrics accumulators shared across one pipeline run.
//!
//! Both are passive collectors owned by the orchestrator and passed by `&mut`
//! reference into every component. They are reset per run by constructing
//! fresh values. Nothing here does I/O; persistence of the metrics row is the
//! runner's job.

use crate::source::SourceId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Categories an error message can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    ApiSports,
    ApiFootball,
    Validation,
    Transformation,
    Load,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 5] = [
        ErrorCategory::ApiSports,
        ErrorCategory::ApiFootball,
        ErrorCategory::Validation,
        ErrorCategory::Transformation,
        ErrorCategory::Load,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ErrorCategory::ApiSports => "api_sports",
            ErrorCategory::ApiFootball => "api_football",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Transformation => "transformation",
            ErrorCategory::Load => "load",
        }
    }

    /// Category a source's extraction failures are filed under.
    pub fn for_source(source: SourceId) -> Self {
        match source {
            SourceId::ApiSports => ErrorCategory::ApiSports,
            SourceId::ApiFootball => ErrorCategory::ApiFootball,
        }
    }

    fn index(&self) -> usize {
        match self {
            ErrorCategory::ApiSports => 0,
            ErrorCategory::ApiFootball => 1,
            ErrorCategory::Validation => 2,
            ErrorCategory::Transformation => 3,
            ErrorCategory::Load => 4,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Append-only log of categorized failure messages for one run.
#[derive(Debug, Default)]
pub struct ErrorLog {
    entries: [Vec<String>; 5],
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message under the given category.
    pub fn record(&mut self, category: ErrorCategory, message: impl Into<String>) {
        self.entries[category.index()].push(message.into());
    }

    /// Messages recorded under one category, in append order.
    pub fn messages(&self, category: ErrorCategory) -> &[String] {
        &self.entries[category.index()]
    }

    pub fn count(&self, category: ErrorCategory) -> usize {
        self.entries[category.index()].len()
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (ErrorCategory, &[String])> {
        ErrorCategory::ALL
            .iter()
            .map(|c| (*c, self.messages(*c)))
    }

    /// Formatted per-category breakdown for alert bodies and the CLI summary.
    /// Shows at most five messages per category.
    pub fn report(&self) -> String {
        if self.is_empty() {
            return "No errors encountered.".to_string();
        }

        let mut out = format!("Total errors: {}\n", self.total());
        for (category, messages) in self.iter() {
            if messages.is_empty() {
                continue;
            }
            out.push_str(&format!(
                "\n{}: {} errors\n",
                category.key().to_uppercase(),
                messages.len()
            ));
            for message in messages.iter().take(5) {
                out.push_str(&format!("  - {message}\n"));
            }
            if messages.len() > 5 {
                out.push_str(&format!("  ... and {} more\n", messages.len() - 5));
            }
        }
        out
    }
}

/// Overall outcome of a run, derived from the two per-source outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Partial,
    Failed,
}

impl RunStatus {
    pub fn from_outcomes(api_sports_ok: bool, api_football_ok: bool) -> Self {
        match (api_sports_ok, api_football_ok) {
            (true, true) => RunStatus::Success,
            (false, false) => RunStatus::Failed,
            _ => RunStatus::Partial,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Partial => "partial",
            RunStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct SourceStats {
    calls: u32,
    latency: Duration,
    errors: u32,
    teams_processed: u32,
}

/// Call-timing and counter accumulator for one run.
///
/// `begin()` stamps the start time; components record calls and errors as
/// they happen; `summary()` finalizes into the fixed-schema [`MetricsRow`]
/// the metrics sink appends.
#[derive(Debug, Default)]
pub struct RunMetrics {
    started_at: Option<NaiveDateTime>,
    finished_at: Option<NaiveDateTime>,
    api_sports: SourceStats,
    api_football: SourceStats,
}

impl RunMetrics {
    /// Create the accumulator and stamp the run start time.
    pub fn begin() -> Self {
        Self {
            started_at: Some(chrono::Local::now().naive_local()),
            ..Self::default()
        }
    }

    /// Stamp the run end time.
    pub fn finish(&mut self) {
        self.finished_at = Some(chrono::Local::now().naive_local());
    }

    fn stats_mut(&mut self, source: SourceId) -> &mut SourceStats {
        match source {
            SourceId::ApiSports => &mut self.api_sports,
            SourceId::ApiFootball => &mut self.api_football,
        }
    }

    fn stats(&self, source: SourceId) -> &SourceStats {
        match source {
            SourceId::ApiSports => &self.api_sports,
            SourceId::ApiFootball => &self.api_football,
        }
    }

    /// Record one completed upstream call and its duration.
    pub fn record_call(&mut self, source: SourceId, elapsed: Duration) {
        let stats = self.stats_mut(source);
        stats.calls += 1;
        stats.latency += elapsed;
    }

    /// Record one failed upstream attempt.
    pub fn record_error(&mut self, source: SourceId) {
        self.stats_mut(source).errors += 1;
    }

    /// Record how many teams a source's transform produced.
    pub fn record_teams_processed(&mut self, source: SourceId, count: usize) {
        self.stats_mut(source).teams_processed = count as u32;
    }

    pub fn calls(&self, source: SourceId) -> u32 {
        self.stats(source).calls
    }

    pub fn errors(&self, source: SourceId) -> u32 {
        self.stats(source).errors
    }

    pub fn teams_processed(&self, source: SourceId) -> u32 {
        self.stats(source).teams_processed
    }

    fn avg_latency_seconds(&self, source: SourceId) -> f64 {
        let stats = self.stats(source);
        if stats.calls == 0 {
            return 0.0;
        }
        stats.latency.as_secs_f64() / f64::from(stats.calls)
    }

    /// Finalize into the fixed-schema row the metrics sink appends.
    ///
    /// `total_errors` comes from the [`ErrorLog`] so the row reflects every
    /// category, not just extraction failures.
    pub fn summary(&self, status: RunStatus, total_errors: usize) -> MetricsRow {
        let started = self
            .started_at
            .unwrap_or_else(|| chrono::Local::now().naive_local());
        let duration_seconds = match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => (end - start).num_milliseconds() as f64 / 1000.0,
            _ => 0.0,
        };

        MetricsRow {
            timestamp: started,
            pipeline_duration_seconds: duration_seconds,
            api_sports_call_count: self.api_sports.calls,
            api_football_call_count: self.api_football.calls,
            api_sports_avg_latency_seconds: self.avg_latency_seconds(SourceId::ApiSports),
            api_football_avg_latency_seconds: self.avg_latency_seconds(SourceId::ApiFootball),
            api_sports_error_count: self.api_sports.errors,
            api_football_error_count: self.api_football.errors,
            total_error_count: total_errors as u32,
            teams_processed_api_sports: self.api_sports.teams_processed,
            teams_processed_api_football: self.api_football.teams_processed,
            pipeline_status: status,
        }
    }
}

/// One row of the `execution_metrics` table, appended once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRow {
    pub timestamp: NaiveDateTime,
    pub pipeline_duration_seconds: f64,
    pub api_sports_call_count: u32,
    pub api_football_call_count: u32,
    pub api_sports_avg_latency_seconds: f64,
    pub api_football_avg_latency_seconds: f64,
    pub api_sports_error_count: u32,
    pub api_football_error_count: u32,
    pub total_error_count: u32,
    pub teams_processed_api_sports: u32,
    pub teams_processed_api_football: u32,
    pub pipeline_status: RunStatus,
}
