//! Structural, schema, and record-level validation.
//!
//! All checks are fail-closed and never panic on malformed input: payloads
//! are inspected through `Option` accessors and `Value::pointer`, so a
//! `false` return (with the failure recorded under the `validation`
//! category) IS the channel for invalid input.
//!
//! The schema checks inspect the first element of a payload for the deeply
//! nested structures the transformer depends on. They exist to catch
//! upstream schema drift early, with a distinct message, instead of letting
//! the transformer skip every record with opaque join misses.

use crate::accumulate::{ErrorCategory, ErrorLog};
use crate::record::RecordDraft;
use crate::source::{DataKind, SourceId};
use serde_json::Value;

/// Container shape a source is contractually expected to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    Object,
    Array,
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn record_failure(errors: &mut ErrorLog, message: String) -> bool {
    tracing::error!("{message}");
    errors.record(ErrorCategory::Validation, message);
    false
}

/// Structural check on a raw payload: non-empty, expected container shape,
/// and every required top-level key present and non-empty.
pub fn validate_response(
    payload: &Value,
    source: SourceId,
    kind: DataKind,
    shape: PayloadShape,
    required_keys: &[&str],
    errors: &mut ErrorLog,
) -> bool {
    if is_empty(payload) {
        return record_failure(errors, format!("{source} {kind}: Empty response"));
    }

    let shape_ok = match shape {
        PayloadShape::Object => payload.is_object(),
        PayloadShape::Array => payload.is_array(),
    };
    if !shape_ok {
        return record_failure(
            errors,
            format!("{source} {kind}: Invalid response type"),
        );
    }

    for key in required_keys {
        match payload.get(key) {
            None => {
                return record_failure(
                    errors,
                    format!("{source} {kind}: Missing '{key}' key"),
                );
            }
            Some(value) if is_empty(value) => {
                return record_failure(
                    errors,
                    format!("{source} {kind}: Empty '{key}' value"),
                );
            }
            Some(_) => {}
        }
    }

    tracing::info!(%source, %kind, "structural validation passed");
    true
}

/// Schema check for the API-Sports pair: the sample team entry must carry
/// the `team`/`venue` sub-objects and `team.id`; the sample standing must
/// carry the `team`/`all` sub-objects and the `all.goals` aggregate.
pub fn validate_api_sports_schema(
    teams: &Value,
    standings: &Value,
    errors: &mut ErrorLog,
) -> bool {
    let source = SourceId::ApiSports;

    if let Some(sample) = teams.pointer("/response/0") {
        if sample.get("team").is_none() || sample.get("venue").is_none() {
            return record_failure(
                errors,
                format!("{source}: Schema change - missing team or venue structure"),
            );
        }
        if sample.pointer("/team/id").is_none() {
            return record_failure(
                errors,
                format!("{source}: Schema change - missing team.id"),
            );
        }
    }

    // The standings table lives under response[0].league.standings[0]; if
    // that whole path is gone the envelope itself changed.
    let table = match standings
        .pointer("/response/0/league/standings/0")
        .and_then(Value::as_array)
    {
        Some(table) => table,
        None => {
            return record_failure(
                errors,
                format!("{source}: Schema changed - standings table not found"),
            );
        }
    };

    if let Some(sample) = table.first() {
        if sample.get("team").is_none() || sample.get("all").is_none() {
            return record_failure(
                errors,
                format!("{source}: Schema change - missing team or all structure"),
            );
        }
        if sample.pointer("/all/goals").is_none() {
            return record_failure(
                errors,
                format!("{source}: Schema change - missing goals structure"),
            );
        }
    }

    tracing::info!(%source, "schema validation passed");
    true
}

/// Schema check for the API-Football pair: the sample team must carry
/// `team_key` and a `venue` object; the sample standing must carry
/// `team_id` plus the position and points fields.
pub fn validate_api_football_schema(
    teams: &Value,
    standings: &Value,
    errors: &mut ErrorLog,
) -> bool {
    let source = SourceId::ApiFootball;

    if let Some(sample) = teams.get(0) {
        if sample.get("team_key").is_none() {
            return record_failure(
                errors,
                format!("{source}: Schema change - missing team_key"),
            );
        }
        if !sample.get("venue").is_some_and(Value::is_object) {
            return record_failure(
                errors,
                format!("{source}: Schema change - venue structure changed"),
            );
        }
    }

    if let Some(sample) = standings.get(0) {
        if sample.get("team_id").is_none() {
            return record_failure(
                errors,
                format!("{source}: Schema change - missing team_id"),
            );
        }
        let critical = ["overall_league_position", "overall_league_PTS"];
        let missing: Vec<&str> = critical
            .iter()
            .copied()
            .filter(|f| sample.get(f).is_none())
            .collect();
        if !missing.is_empty() {
            return record_failure(
                errors,
                format!("{source}: Schema change - missing {missing:?}"),
            );
        }
    }

    tracing::info!(%source, "schema validation passed");
    true
}

/// Record-level check: the four mandatory unified fields must be present.
/// Returns the missing-field list for diagnostics.
pub fn validate_team_record(
    draft: &RecordDraft,
    source: SourceId,
    errors: &mut ErrorLog,
) -> Result<(), Vec<&'static str>> {
    let missing = draft.missing_required();
    if missing.is_empty() {
        return Ok(());
    }

    tracing::warn!(%source, ?missing, "team record missing required fields");
    errors.record(
        ErrorCategory::Validation,
        format!("{source}: Missing fields {missing:?}"),
    );
    Err(missing)
}
