//! Typed views over the two upstream raw schemas.
//!
//! Every leaf field is `Option`-typed: an absent or null field deserializes
//! to `None` and surfaces as a type-checked branch in the transformer instead
//! of a lookup failure. Entries are deserialized one at a time so a single
//! malformed element never aborts the batch.
//!
//! API-Sports nests everything (`team`/`venue` sub-objects, standings under
//! `response[0].league.standings[0]`, aggregates under `all.goals`).
//! API-Football is flat and string-typed throughout; numeric fields go
//! through [`parse_int`].

use serde::Deserialize;

// ── API-Sports ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct SportsTeamEntry {
    pub team: Option<SportsTeam>,
    pub venue: Option<SportsVenue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SportsTeam {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub country: Option<String>,
    pub founded: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SportsVenue {
    pub name: Option<String>,
    pub city: Option<String>,
    pub capacity: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SportsStanding {
    pub rank: Option<i64>,
    pub points: Option<i64>,
    #[serde(rename = "goalsDiff")]
    pub goals_diff: Option<i64>,
    pub team: Option<SportsStandingTeam>,
    pub all: Option<SportsAggregate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SportsStandingTeam {
    pub id: Option<i64>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SportsAggregate {
    pub win: Option<i64>,
    pub draw: Option<i64>,
    pub lose: Option<i64>,
    pub goals: Option<SportsGoals>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SportsGoals {
    #[serde(rename = "for")]
    pub goals_for: Option<i64>,
    pub against: Option<i64>,
}

// ── API-Football ────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct FootballTeam {
    pub team_key: Option<String>,
    pub team_name: Option<String>,
    pub team_country: Option<String>,
    pub team_founded: Option<String>,
    pub venue: Option<FootballVenue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FootballVenue {
    pub venue_name: Option<String>,
    pub venue_city: Option<String>,
    pub venue_capacity: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FootballStanding {
    pub team_id: Option<String>,
    pub team_name: Option<String>,
    pub overall_league_position: Option<String>,
    #[serde(rename = "overall_league_PTS")]
    pub overall_league_pts: Option<String>,
    #[serde(rename = "overall_league_GF")]
    pub overall_league_gf: Option<String>,
    #[serde(rename = "overall_league_GA")]
    pub overall_league_ga: Option<String>,
    #[serde(rename = "overall_league_W")]
    pub overall_league_w: Option<String>,
    #[serde(rename = "overall_league_D")]
    pub overall_league_d: Option<String>,
    #[serde(rename = "overall_league_L")]
    pub overall_league_l: Option<String>,
}

/// Coerce API-Football's stringly-typed numerics. Empty, absent, and
/// non-numeric values all come back as `None`.
pub fn parse_int(value: Option<&str>) -> Option<i64> {
    value.and_then(|s| s.trim().parse::<i64>().ok())
}

/// A string field that is `Some` but empty means "not provided".
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sports_standing_deserializes_nested_goals() {
        let standing: SportsStanding = serde_json::from_value(json!({
            "rank": 1,
            "points": 84,
            "goalsDiff": 59,
            "team": {"id": 10, "name": "Arsenal"},
            "all": {"win": 26, "draw": 6, "lose": 6, "goals": {"for": 88, "against": 29}}
        }))
        .unwrap();

        assert_eq!(standing.team.unwrap().id, Some(10));
        assert_eq!(standing.goals_diff, Some(59));
        let goals = standing.all.unwrap().goals.unwrap();
        assert_eq!(goals.goals_for, Some(88));
        assert_eq!(goals.against, Some(29));
    }

    #[test]
    fn absent_fields_become_none() {
        let entry: SportsTeamEntry = serde_json::from_value(json!({
            "team": {"id": 5}
        }))
        .unwrap();

        assert!(entry.venue.is_none());
        let team = entry.team.unwrap();
        assert_eq!(team.id, Some(5));
        assert!(team.name.is_none());
        assert!(team.founded.is_none());
    }

    #[test]
    fn football_standing_keeps_upstream_field_casing() {
        let standing: FootballStanding = serde_json::from_value(json!({
            "team_id": "141",
            "overall_league_position": "2",
            "overall_league_PTS": "74",
            "overall_league_GF": "80",
            "overall_league_GA": "38"
        }))
        .unwrap();

        assert_eq!(standing.team_id.as_deref(), Some("141"));
        assert_eq!(standing.overall_league_pts.as_deref(), Some("74"));
        assert_eq!(standing.overall_league_gf.as_deref(), Some("80"));
        assert!(standing.overall_league_w.is_none());
    }

    #[test]
    fn parse_int_rejects_garbage() {
        assert_eq!(parse_int(Some("42")), Some(42));
        assert_eq!(parse_int(Some(" 7 ")), Some(7));
        assert_eq!(parse_int(Some("")), None);
        assert_eq!(parse_int(Some("n/a")), None);
        assert_eq!(parse_int(None), None);
    }

    #[test]
    fn non_empty_filters_blank_strings() {
        assert_eq!(non_empty(Some("Emirates".into())), Some("Emirates".into()));
        assert_eq!(non_empty(Some("  ".into())), None);
        assert_eq!(non_empty(None), None);
    }
}
