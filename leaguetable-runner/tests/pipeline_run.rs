//! End-to-end pipeline runs against scripted transports and a temp-dir
//! warehouse: no network, no SMTP, real Parquet and CSV sinks.

use leaguetable_core::{
    ErrorLog, Extractor, MetricsRow, RunStatus, Sleeper, SourceEndpoint, TeamRecord, Transport,
    TransportError, TransportResponse,
};
use leaguetable_runner::alert::{Alerter, EmailAlerter};
use leaguetable_runner::pipeline::{Pipeline, RunParams, API_FOOTBALL_TABLE, API_SPORTS_TABLE};
use leaguetable_runner::warehouse::{LoadError, LocalWarehouse, Warehouse};
use polars::prelude::*;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

struct ScriptedTransport {
    script: RefCell<VecDeque<Result<TransportResponse, TransportError>>>,
}

impl ScriptedTransport {
    fn new(script: Vec<Result<TransportResponse, TransportError>>) -> Self {
        Self {
            script: RefCell::new(script.into()),
        }
    }
}

impl Transport for ScriptedTransport {
    fn get(
        &self,
        _url: &str,
        _headers: &[(String, String)],
        _query: &[(String, String)],
    ) -> Result<TransportResponse, TransportError> {
        self.script
            .borrow_mut()
            .pop_front()
            .expect("transport script exhausted")
    }
}

struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _delay: Duration) {}
}

/// Captures what the pipeline hands to the notification sink.
#[derive(Default)]
struct RecordingAlerter {
    calls: RefCell<Vec<(RunStatus, String, usize, usize)>>,
}

impl Alerter for RecordingAlerter {
    fn notify(
        &self,
        status: RunStatus,
        errors: &ErrorLog,
        api_sports_teams: usize,
        api_football_teams: usize,
    ) {
        self.calls.borrow_mut().push((
            status,
            errors.report(),
            api_sports_teams,
            api_football_teams,
        ));
    }
}

/// Delegates to a real warehouse but fails on demand, per sink.
struct FlakyWarehouse {
    inner: LocalWarehouse,
    fail_table: &'static str,
    fail_metrics: bool,
}

impl Warehouse for FlakyWarehouse {
    fn load_table(&self, records: &[TeamRecord], table: &str) -> Result<(), LoadError> {
        if table == self.fail_table {
            return Err(LoadError::Parquet("no space left on device".to_string()));
        }
        self.inner.load_table(records, table)
    }

    fn append_metrics(&self, row: &MetricsRow) -> Result<(), LoadError> {
        if self.fail_metrics {
            return Err(LoadError::Metrics("metrics file locked".to_string()));
        }
        self.inner.append_metrics(row)
    }
}

fn ok(body: Value) -> Result<TransportResponse, TransportError> {
    Ok(TransportResponse {
        status: 200,
        body: body.to_string(),
    })
}

fn scripted_extractor(
    endpoint: SourceEndpoint,
    script: Vec<Result<TransportResponse, TransportError>>,
) -> Extractor {
    Extractor::with_parts(
        endpoint,
        Box::new(ScriptedTransport::new(script)),
        Box::new(NoSleep),
    )
}

fn api_sports_teams() -> Value {
    json!({"response": [
        {
            "team": {"id": 10, "name": "Arsenal", "country": "England", "founded": 1886},
            "venue": {"name": "Emirates Stadium", "city": "London", "capacity": 60383}
        },
        {
            "team": {"id": 20, "name": "Everton", "country": "England", "founded": 1878},
            "venue": {"name": "Goodison Park", "city": "Liverpool", "capacity": 39414}
        }
    ]})
}

fn api_sports_standings() -> Value {
    json!({"response": [{"league": {"standings": [[
        {"rank": 1, "points": 84, "goalsDiff": 59, "team": {"id": 10, "name": "Arsenal"},
         "all": {"win": 26, "draw": 6, "lose": 6, "goals": {"for": 88, "against": 29}}},
        {"rank": 15, "points": 40, "goalsDiff": -11, "team": {"id": 20, "name": "Everton"},
         "all": {"win": 9, "draw": 13, "lose": 16, "goals": {"for": 40, "against": 51}}}
    ]]}}]})
}

fn api_football_teams() -> Value {
    json!([
        {
            "team_key": "141", "team_name": "Liverpool", "team_country": "England",
            "team_founded": "1892",
            "venue": {"venue_name": "Anfield", "venue_city": "Liverpool",
                      "venue_capacity": "61276"}
        }
    ])
}

fn api_football_standings() -> Value {
    json!([
        {"team_id": "141", "team_name": "Liverpool", "overall_league_position": "2",
         "overall_league_PTS": "82", "overall_league_GF": "86", "overall_league_GA": "41",
         "overall_league_W": "24", "overall_league_D": "10", "overall_league_L": "4"}
    ])
}

fn params(artifacts_dir: Option<&Path>) -> RunParams {
    RunParams {
        season: "2023".to_string(),
        api_sports_league: "39".to_string(),
        api_football_league: "152".to_string(),
        artifacts_dir: artifacts_dir.map(Path::to_path_buf),
    }
}

fn table_height(warehouse: &LocalWarehouse, table: &str) -> usize {
    let file = std::fs::File::open(warehouse.table_path(table)).unwrap();
    ParquetReader::new(file).finish().unwrap().height()
}

#[test]
fn full_run_loads_both_tables_and_appends_success_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let warehouse = LocalWarehouse::new(dir.path().join("warehouse")).unwrap();
    let artifacts = dir.path().join("artifacts");
    std::fs::create_dir_all(&artifacts).unwrap();
    let alerter = RecordingAlerter::default();

    let pipeline = Pipeline::with_extractors(
        scripted_extractor(
            SourceEndpoint::api_sports("k"),
            vec![ok(api_sports_teams()), ok(api_sports_standings())],
        ),
        scripted_extractor(
            SourceEndpoint::api_football("k"),
            vec![ok(api_football_teams()), ok(api_football_standings())],
        ),
        &warehouse,
        &alerter,
        params(Some(&artifacts)),
    );

    let report = pipeline.run();

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.api_sports_teams, 2);
    assert_eq!(report.api_football_teams, 1);
    assert_eq!(report.error_report, "No errors encountered.");

    assert_eq!(table_height(&warehouse, API_SPORTS_TABLE), 2);
    assert_eq!(table_height(&warehouse, API_FOOTBALL_TABLE), 1);

    let metrics = std::fs::read_to_string(warehouse.metrics_path()).unwrap();
    let lines: Vec<&str> = metrics.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].ends_with("success"));
    assert_eq!(report.metrics.api_sports_call_count, 2);
    assert_eq!(report.metrics.api_football_call_count, 2);
    assert_eq!(report.metrics.teams_processed_api_sports, 2);
    assert_eq!(report.metrics.teams_processed_api_football, 1);

    // Raw payload and transformed-record audit copies.
    for name in [
        "api_sports_teams_raw.json",
        "api_sports_standings_raw.json",
        "api_sports_records.json",
        "api_sports_records.csv",
        "api_football_teams_raw.json",
        "api_football_standings_raw.json",
        "api_football_records.json",
        "api_football_records.csv",
    ] {
        assert!(artifacts.join(name).exists(), "missing artifact {name}");
    }

    // The notification sink saw a success payload with both team counts.
    let calls = alerter.calls.borrow();
    assert_eq!(calls.len(), 1);
    let (status, body, api_sports, api_football) = &calls[0];
    assert_eq!(*status, RunStatus::Success);
    assert_eq!(body, "No errors encountered.");
    assert_eq!((*api_sports, *api_football), (2, 1));
}

#[test]
fn schema_drift_in_one_source_yields_partial_run() {
    let dir = tempfile::tempdir().unwrap();
    let warehouse = LocalWarehouse::new(dir.path()).unwrap();
    let alerter = RecordingAlerter::default();

    // API-Football standings lost their points column.
    let drifted = json!([
        {"team_id": "141", "team_name": "Liverpool", "overall_league_position": "2"}
    ]);

    let pipeline = Pipeline::with_extractors(
        scripted_extractor(
            SourceEndpoint::api_sports("k"),
            vec![ok(api_sports_teams()), ok(api_sports_standings())],
        ),
        scripted_extractor(
            SourceEndpoint::api_football("k"),
            vec![ok(api_football_teams()), ok(drifted)],
        ),
        &warehouse,
        &alerter,
        params(None),
    );

    let report = pipeline.run();

    assert_eq!(report.status, RunStatus::Partial);
    assert_eq!(report.api_sports_teams, 2);
    assert_eq!(report.api_football_teams, 0);
    assert!(report.error_report.contains("Schema change"));

    // The healthy source still loaded; the drifted one never did.
    assert_eq!(table_height(&warehouse, API_SPORTS_TABLE), 2);
    assert!(!warehouse.table_path(API_FOOTBALL_TABLE).exists());

    let metrics = std::fs::read_to_string(warehouse.metrics_path()).unwrap();
    assert!(metrics.lines().nth(1).unwrap().ends_with("partial"));

    let calls = alerter.calls.borrow();
    assert_eq!(calls[0].0, RunStatus::Partial);
    assert!(calls[0].1.contains("Schema change"));
}

#[test]
fn warehouse_failures_degrade_status_and_reach_the_notification() {
    let dir = tempfile::tempdir().unwrap();
    let warehouse = FlakyWarehouse {
        inner: LocalWarehouse::new(dir.path()).unwrap(),
        fail_table: API_FOOTBALL_TABLE,
        fail_metrics: true,
    };
    let alerter = RecordingAlerter::default();

    let pipeline = Pipeline::with_extractors(
        scripted_extractor(
            SourceEndpoint::api_sports("k"),
            vec![ok(api_sports_teams()), ok(api_sports_standings())],
        ),
        scripted_extractor(
            SourceEndpoint::api_football("k"),
            vec![ok(api_football_teams()), ok(api_football_standings())],
        ),
        &warehouse,
        &alerter,
        params(None),
    );

    let report = pipeline.run();

    // One table load failed, so that source counts as failed.
    assert_eq!(report.status, RunStatus::Partial);
    assert_eq!(report.api_sports_teams, 2);
    assert_eq!(report.api_football_teams, 0);
    assert!(report.error_report.contains("no space left on device"));
    assert!(report.error_report.contains("Metrics append failed"));

    assert!(warehouse.inner.table_path(API_SPORTS_TABLE).exists());
    assert!(!warehouse.inner.table_path(API_FOOTBALL_TABLE).exists());
    assert!(!warehouse.inner.metrics_path().exists());

    // The notification still went out and carries both sink failures.
    let calls = alerter.calls.borrow();
    let (status, body, api_sports, api_football) = &calls[0];
    assert_eq!(*status, RunStatus::Partial);
    assert!(body.contains("no space left on device"));
    assert!(body.contains("Metrics append failed"));
    assert_eq!((*api_sports, *api_football), (2, 0));
}

#[test]
fn both_sources_down_yields_failed_run_with_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let warehouse = LocalWarehouse::new(dir.path()).unwrap();
    let alerter = EmailAlerter::disabled();

    let pipeline = Pipeline::with_extractors(
        scripted_extractor(
            SourceEndpoint::api_sports("k"),
            vec![Ok(TransportResponse {
                status: 500,
                body: "server error".to_string(),
            })],
        ),
        scripted_extractor(
            SourceEndpoint::api_football("k"),
            vec![
                Err(TransportError::Timeout),
                Err(TransportError::Timeout),
                Err(TransportError::Timeout),
            ],
        ),
        &warehouse,
        &alerter,
        params(None),
    );

    let report = pipeline.run();

    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.api_sports_teams, 0);
    assert_eq!(report.api_football_teams, 0);
    assert!(report.error_report.contains("HTTP 500"));
    assert!(report.error_report.contains("Timeout attempt 3"));

    assert!(!warehouse.table_path(API_SPORTS_TABLE).exists());
    assert!(!warehouse.table_path(API_FOOTBALL_TABLE).exists());

    // The run still accounts for itself even when everything upstream died.
    let metrics = std::fs::read_to_string(warehouse.metrics_path()).unwrap();
    assert!(metrics.lines().nth(1).unwrap().ends_with("failed"));
    assert_eq!(report.metrics.api_sports_error_count, 1);
    assert_eq!(report.metrics.api_football_error_count, 3);
}
