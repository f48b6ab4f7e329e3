//! End-to-end pipeline orchestration.
//!
//! One run processes the two sources sequentially and independently: a
//! failure anywhere in one source's extract/transform/load pass abandons that
//! source but never the other. The overall status is derived from the two
//! per-source outcomes, the metrics row is appended, and the notification
//! email goes out last, after everything it reports on has happened.

use crate::alert::{Alerter, EmailAlerter};
use crate::config::PipelineConfig;
use crate::warehouse::{LocalWarehouse, Warehouse};
use leaguetable_core::{
    ApiFootballTransformer, ApiSportsTransformer, ErrorCategory, ErrorLog, Extractor, MetricsRow,
    RunMetrics, RunStatus, SourceEndpoint, SourceId, TeamRecord,
};
use std::path::PathBuf;

/// Warehouse table refreshed from the API-Sports source.
pub const API_SPORTS_TABLE: &str = "api_sports_teams";

/// Warehouse table refreshed from the API-Football source.
pub const API_FOOTBALL_TABLE: &str = "api_football_teams";

/// Per-run parameters the extractors and transformers need.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub season: String,
    pub api_sports_league: String,
    pub api_football_league: String,
    /// When set, raw payloads and transformed records are dumped here.
    pub artifacts_dir: Option<PathBuf>,
}

impl RunParams {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            season: config.season.clone(),
            api_sports_league: config.api_sports_league.clone(),
            api_football_league: config.api_football_league.clone(),
            artifacts_dir: config.artifacts_dir.clone(),
        }
    }
}

/// What one pipeline run produced.
#[derive(Debug)]
pub struct RunReport {
    pub status: RunStatus,
    pub api_sports_teams: usize,
    pub api_football_teams: usize,
    pub metrics: MetricsRow,
    /// Human-readable per-category error breakdown.
    pub error_report: String,
}

/// The assembled pipeline: two extractors, sinks, and run parameters.
pub struct Pipeline<'a> {
    api_sports: Extractor,
    api_football: Extractor,
    warehouse: &'a dyn Warehouse,
    alerter: &'a dyn Alerter,
    params: RunParams,
}

impl<'a> Pipeline<'a> {
    /// Production pipeline with real HTTP extractors.
    pub fn from_config(
        config: &PipelineConfig,
        warehouse: &'a dyn Warehouse,
        alerter: &'a dyn Alerter,
    ) -> Self {
        Self::with_extractors(
            Extractor::new(SourceEndpoint::api_sports(config.api_sports_key.clone())),
            Extractor::new(SourceEndpoint::api_football(config.api_football_key.clone())),
            warehouse,
            alerter,
            RunParams::from_config(config),
        )
    }

    /// Pipeline with injected extractors. Used by tests with scripted
    /// transports.
    pub fn with_extractors(
        api_sports: Extractor,
        api_football: Extractor,
        warehouse: &'a dyn Warehouse,
        alerter: &'a dyn Alerter,
        params: RunParams,
    ) -> Self {
        debug_assert_eq!(api_sports.source(), SourceId::ApiSports);
        debug_assert_eq!(api_football.source(), SourceId::ApiFootball);
        Self {
            api_sports,
            api_football,
            warehouse,
            alerter,
            params,
        }
    }

    fn artifact_path(&self, name: &str) -> Option<PathBuf> {
        self.params.artifacts_dir.as_ref().map(|dir| dir.join(name))
    }

    /// Best-effort CSV copy of a source's records next to the JSON audit
    /// dumps.
    fn export_csv(&self, records: &[TeamRecord], source: SourceId) {
        if let Some(path) = self.artifact_path(&format!("{}_records.csv", source.key())) {
            if let Err(err) = crate::export::write_records_csv(records, &path) {
                tracing::warn!(%source, error = %err, "records CSV export failed");
            }
        }
    }

    /// Extract, transform, and load one source. Returns the number of teams
    /// loaded, or `None` when the source failed at any stage.
    fn run_api_sports(&self, errors: &mut ErrorLog, metrics: &mut RunMetrics) -> Option<usize> {
        let source = SourceId::ApiSports;
        let query = [
            ("league", self.params.api_sports_league.as_str()),
            ("season", self.params.season.as_str()),
        ];

        let teams = self
            .api_sports
            .fetch(
                "teams",
                &query,
                self.artifact_path(&format!("{}_teams_raw.json", source.key())).as_deref(),
                errors,
                Some(metrics),
            )
            .map_err(|err| tracing::error!(%source, error = %err, "teams extraction failed"))
            .ok()?;
        let standings = self
            .api_sports
            .fetch(
                "standings",
                &query,
                self.artifact_path(&format!("{}_standings_raw.json", source.key())).as_deref(),
                errors,
                Some(metrics),
            )
            .map_err(|err| tracing::error!(%source, error = %err, "standings extraction failed"))
            .ok()?;

        let outcome = ApiSportsTransformer
            .transform(
                &teams,
                &standings,
                self.artifact_path(&format!("{}_records.json", source.key())).as_deref(),
                errors,
            )
            .map_err(|err| tracing::error!(%source, error = %err, "transformation failed"))
            .ok()?;
        metrics.record_teams_processed(source, outcome.records.len());
        self.export_csv(&outcome.records, source);

        if let Err(err) = self.warehouse.load_table(&outcome.records, API_SPORTS_TABLE) {
            errors.record(ErrorCategory::Load, format!("{source}: {err}"));
            tracing::error!(%source, error = %err, "warehouse load failed");
            return None;
        }
        Some(outcome.records.len())
    }

    fn run_api_football(&self, errors: &mut ErrorLog, metrics: &mut RunMetrics) -> Option<usize> {
        let source = SourceId::ApiFootball;
        let query = [("league_id", self.params.api_football_league.as_str())];

        let teams = self
            .api_football
            .fetch(
                "get_teams",
                &query,
                self.artifact_path(&format!("{}_teams_raw.json", source.key())).as_deref(),
                errors,
                Some(metrics),
            )
            .map_err(|err| tracing::error!(%source, error = %err, "teams extraction failed"))
            .ok()?;
        let standings = self
            .api_football
            .fetch(
                "get_standings",
                &query,
                self.artifact_path(&format!("{}_standings_raw.json", source.key())).as_deref(),
                errors,
                Some(metrics),
            )
            .map_err(|err| tracing::error!(%source, error = %err, "standings extraction failed"))
            .ok()?;

        let outcome = ApiFootballTransformer
            .transform(
                &teams,
                &standings,
                self.artifact_path(&format!("{}_records.json", source.key())).as_deref(),
                errors,
            )
            .map_err(|err| tracing::error!(%source, error = %err, "transformation failed"))
            .ok()?;
        metrics.record_teams_processed(source, outcome.records.len());
        self.export_csv(&outcome.records, source);

        if let Err(err) = self.warehouse.load_table(&outcome.records, API_FOOTBALL_TABLE) {
            errors.record(ErrorCategory::Load, format!("{source}: {err}"));
            tracing::error!(%source, error = %err, "warehouse load failed");
            return None;
        }
        Some(outcome.records.len())
    }

    /// Execute one full run. Never fails as a whole: per-source failures are
    /// absorbed into the status and the error report.
    pub fn run(&self) -> RunReport {
        let mut errors = ErrorLog::new();
        let mut metrics = RunMetrics::begin();
        tracing::info!(
            season = %self.params.season,
            "pipeline run starting"
        );

        let api_sports = self.run_api_sports(&mut errors, &mut metrics);
        let api_football = self.run_api_football(&mut errors, &mut metrics);
        metrics.finish();

        let status = RunStatus::from_outcomes(api_sports.is_some(), api_football.is_some());
        let row = metrics.summary(status, errors.total());
        if let Err(err) = self.warehouse.append_metrics(&row) {
            errors.record(ErrorCategory::Load, format!("Metrics append failed: {err}"));
            tracing::error!(error = %err, "metrics append failed");
        }

        let api_sports_teams = api_sports.unwrap_or(0);
        let api_football_teams = api_football.unwrap_or(0);
        self.alerter
            .notify(status, &errors, api_sports_teams, api_football_teams);

        tracing::info!(
            %status,
            api_sports_teams,
            api_football_teams,
            total_errors = errors.total(),
            "pipeline run complete"
        );
        RunReport {
            status,
            api_sports_teams,
            api_football_teams,
            metrics: row,
            error_report: errors.report(),
        }
    }
}

/// Convenience entry point: build the local warehouse and alerter from
/// configuration and run once.
pub fn run_pipeline(config: &PipelineConfig) -> anyhow::Result<RunReport> {
    let warehouse = LocalWarehouse::new(&config.warehouse_dir)?;
    if let Some(dir) = &config.artifacts_dir {
        std::fs::create_dir_all(dir)?;
    }
    let alerter = EmailAlerter::new(config.alert.clone());
    let pipeline = Pipeline::from_config(config, &warehouse, &alerter);
    Ok(pipeline.run())
}
