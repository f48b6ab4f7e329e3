//! Per-source transformers joining team and standings payloads into unified
//! records.
//!
//! Both transformers follow the same pipeline: structural validation, schema
//! validation, a standings lookup keyed by team id, then a per-team mapping
//! pass. Payload-level failures abort the source with a [`TransformError`];
//! record-level failures drop only the affected team and are counted in
//! [`TransformOutcome::skipped`].

use crate::accumulate::{ErrorCategory, ErrorLog};
use crate::raw::{
    non_empty, parse_int, FootballStanding, FootballTeam, SportsStanding, SportsTeamEntry,
};
use crate::record::{RecordDraft, TeamRecord};
use crate::source::{DataKind, SourceId};
use crate::validate::{
    validate_api_football_schema, validate_api_sports_schema, validate_response,
    validate_team_record, PayloadShape,
};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Payload-level failure that aborts transformation for one source.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("{source_id} payload failed structural validation")]
    InvalidStructure { source_id: SourceId },
    #[error("{source_id} payload schema has drifted")]
    SchemaDrift { source_id: SourceId },
}

/// Result of one source's transformation pass.
#[derive(Debug, Default)]
pub struct TransformOutcome {
    pub records: Vec<TeamRecord>,
    /// Teams dropped for record-level reasons (join miss, missing fields,
    /// undeserializable entry).
    pub skipped: usize,
}

/// Best-effort audit copy of the transformed records. A write failure is
/// logged and ignored; the records still flow to the warehouse.
fn write_audit(records: &[TeamRecord], path: &Path, source: SourceId) {
    let payload = match serde_json::to_string_pretty(records) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::warn!(%source, error = %err, "failed to serialize audit copy");
            return;
        }
    };
    if let Err(err) = std::fs::write(path, payload) {
        tracing::warn!(%source, path = %path.display(), error = %err, "failed to write audit copy");
    } else {
        tracing::info!(%source, path = %path.display(), "wrote audit copy");
    }
}

/// Transformer for the nested API-Sports payload pair.
#[derive(Debug, Default)]
pub struct ApiSportsTransformer;

impl ApiSportsTransformer {
    pub fn transform(
        &self,
        teams: &Value,
        standings: &Value,
        audit_path: Option<&Path>,
        errors: &mut ErrorLog,
    ) -> Result<TransformOutcome, TransformError> {
        let source = SourceId::ApiSports;

        let teams_ok = validate_response(
            teams,
            source,
            DataKind::Teams,
            PayloadShape::Object,
            &["response"],
            errors,
        );
        let standings_ok = validate_response(
            standings,
            source,
            DataKind::Standings,
            PayloadShape::Object,
            &["response"],
            errors,
        );
        if !teams_ok || !standings_ok {
            return Err(TransformError::InvalidStructure { source_id: source });
        }
        if !validate_api_sports_schema(teams, standings, errors) {
            return Err(TransformError::SchemaDrift { source_id: source });
        }

        // Standings lookup keyed by team id. Entries missing an id cannot be
        // joined and are dropped here.
        let mut by_team: HashMap<i64, SportsStanding> = HashMap::new();
        if let Some(table) = standings
            .pointer("/response/0/league/standings/0")
            .and_then(Value::as_array)
        {
            for row in table {
                match serde_json::from_value::<SportsStanding>(row.clone()) {
                    Ok(standing) => {
                        if let Some(id) = standing.team.as_ref().and_then(|t| t.id) {
                            by_team.insert(id, standing);
                        } else {
                            tracing::warn!(%source, "standing row without team id, dropping");
                        }
                    }
                    Err(err) => {
                        errors.record(
                            ErrorCategory::Transformation,
                            format!("{source}: Failed to parse standing row: {err}"),
                        );
                    }
                }
            }
        }

        let mut outcome = TransformOutcome::default();
        let entries = teams
            .get("response")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for entry in entries {
            let entry: SportsTeamEntry = match serde_json::from_value(entry.clone()) {
                Ok(entry) => entry,
                Err(err) => {
                    errors.record(
                        ErrorCategory::Transformation,
                        format!("{source}: Failed to parse team entry: {err}"),
                    );
                    outcome.skipped += 1;
                    continue;
                }
            };

            let team = entry.team.unwrap_or_else(|| {
                tracing::warn!(%source, "team entry without team object");
                Default::default()
            });
            let venue = entry.venue.unwrap_or_default();

            let standing = team.id.and_then(|id| by_team.get(&id));
            let Some(standing) = standing else {
                tracing::warn!(%source, team_id = ?team.id, "no standing for team, skipping");
                errors.record(
                    ErrorCategory::Transformation,
                    format!("{source}: No standing for team {:?}", team.id),
                );
                outcome.skipped += 1;
                continue;
            };

            let aggregate = standing.all.clone().unwrap_or_default();
            let goals = aggregate.goals.clone().unwrap_or_default();

            let draft = RecordDraft {
                team_id: team.id,
                name: non_empty(team.name),
                country: non_empty(team.country),
                founded: team.founded,
                stadium: non_empty(venue.name),
                city: non_empty(venue.city),
                capacity: venue.capacity,
                rank: standing.rank,
                points: standing.points,
                goal_diff: standing.goals_diff,
                goals_for: goals.goals_for,
                goals_against: goals.against,
                win: aggregate.win,
                draw: aggregate.draw,
                lose: aggregate.lose,
            };

            if validate_team_record(&draft, source, errors).is_err() {
                outcome.skipped += 1;
                continue;
            }
            match draft.finish() {
                Ok(record) => outcome.records.push(record),
                Err(_) => outcome.skipped += 1,
            }
        }

        tracing::info!(
            %source,
            records = outcome.records.len(),
            skipped = outcome.skipped,
            "transformation complete"
        );
        if let Some(path) = audit_path {
            write_audit(&outcome.records, path, source);
        }
        Ok(outcome)
    }
}

/// Transformer for the flat, string-typed API-Football payload pair.
#[derive(Debug, Default)]
pub struct ApiFootballTransformer;

impl ApiFootballTransformer {
    pub fn transform(
        &self,
        teams: &Value,
        standings: &Value,
        audit_path: Option<&Path>,
        errors: &mut ErrorLog,
    ) -> Result<TransformOutcome, TransformError> {
        let source = SourceId::ApiFootball;

        let teams_ok = validate_response(
            teams,
            source,
            DataKind::Teams,
            PayloadShape::Array,
            &[],
            errors,
        );
        let standings_ok = validate_response(
            standings,
            source,
            DataKind::Standings,
            PayloadShape::Array,
            &[],
            errors,
        );
        if !teams_ok || !standings_ok {
            return Err(TransformError::InvalidStructure { source_id: source });
        }
        if !validate_api_football_schema(teams, standings, errors) {
            return Err(TransformError::SchemaDrift { source_id: source });
        }

        // team_id arrives as a string; rows whose id does not parse cannot be
        // joined and are dropped with a warning.
        let mut by_team: HashMap<i64, FootballStanding> = HashMap::new();
        for row in standings.as_array().map(Vec::as_slice).unwrap_or_default() {
            match serde_json::from_value::<FootballStanding>(row.clone()) {
                Ok(standing) => match parse_int(standing.team_id.as_deref()) {
                    Some(id) => {
                        by_team.insert(id, standing);
                    }
                    None => {
                        tracing::warn!(
                            %source,
                            team_id = ?standing.team_id,
                            "standing row with unparseable team id, dropping"
                        );
                    }
                },
                Err(err) => {
                    errors.record(
                        ErrorCategory::Transformation,
                        format!("{source}: Failed to parse standing row: {err}"),
                    );
                }
            }
        }

        let mut outcome = TransformOutcome::default();
        for entry in teams.as_array().map(Vec::as_slice).unwrap_or_default() {
            let team: FootballTeam = match serde_json::from_value(entry.clone()) {
                Ok(team) => team,
                Err(err) => {
                    errors.record(
                        ErrorCategory::Transformation,
                        format!("{source}: Failed to parse team entry: {err}"),
                    );
                    outcome.skipped += 1;
                    continue;
                }
            };

            let team_id = parse_int(team.team_key.as_deref());
            let standing = team_id.and_then(|id| by_team.get(&id));
            let Some(standing) = standing else {
                tracing::warn!(%source, team_id = ?team.team_key, "no standing for team, skipping");
                errors.record(
                    ErrorCategory::Transformation,
                    format!("{source}: No standing for team {:?}", team.team_key),
                );
                outcome.skipped += 1;
                continue;
            };

            let venue = team.venue.unwrap_or_default();

            let draft = RecordDraft {
                team_id,
                name: non_empty(team.team_name),
                country: non_empty(team.team_country),
                founded: parse_int(team.team_founded.as_deref()),
                stadium: non_empty(venue.venue_name),
                city: non_empty(venue.venue_city),
                capacity: parse_int(venue.venue_capacity.as_deref()),
                rank: parse_int(standing.overall_league_position.as_deref()),
                points: parse_int(standing.overall_league_pts.as_deref()),
                // Not supplied by this source; derived from goals for/against.
                goal_diff: None,
                goals_for: parse_int(standing.overall_league_gf.as_deref()),
                goals_against: parse_int(standing.overall_league_ga.as_deref()),
                win: parse_int(standing.overall_league_w.as_deref()),
                draw: parse_int(standing.overall_league_d.as_deref()),
                lose: parse_int(standing.overall_league_l.as_deref()),
            };

            if validate_team_record(&draft, source, errors).is_err() {
                outcome.skipped += 1;
                continue;
            }
            match draft.finish() {
                Ok(record) => outcome.records.push(record),
                Err(_) => outcome.skipped += 1,
            }
        }

        tracing::info!(
            %source,
            records = outcome.records.len(),
            skipped = outcome.skipped,
            "transformation complete"
        );
        if let Some(path) = audit_path {
            write_audit(&outcome.records, path, source);
        }
        Ok(outcome)
    }
}
