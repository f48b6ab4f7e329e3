//! The unified 15-field team record produced by both transformers.
//!
//! Records are built in two steps: the transformer maps source fields into a
//! [`RecordDraft`] where everything is optional, then [`RecordDraft::finish`]
//! enforces the mandatory-field invariant and applies defaults. A record is
//! emitted only when `team_id`, `name`, `rank`, and `points` are all present;
//! drafts failing that are dropped, never null-filled.
//!
//! A legitimate value of zero for numeric fields is valid data. Absence means
//! `None`, not `0`.

use serde::{Deserialize, Serialize};

/// The four fields a draft must carry to become a [`TeamRecord`].
pub const REQUIRED_FIELDS: [&str; 4] = ["team_id", "name", "rank", "points"];

/// Canonical per-team record, one per team per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub team_id: i64,
    pub name: String,
    pub country: Option<String>,
    pub founded: Option<i64>,
    pub stadium: Option<String>,
    pub city: Option<String>,
    pub capacity: Option<i64>,
    pub rank: i64,
    pub points: i64,
    pub goal_diff: i64,
    pub goals_for: i64,
    pub goals_against: i64,
    pub win: i64,
    pub draw: i64,
    pub lose: i64,
}

/// A unified record before the mandatory-field invariant is enforced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordDraft {
    pub team_id: Option<i64>,
    pub name: Option<String>,
    pub country: Option<String>,
    pub founded: Option<i64>,
    pub stadium: Option<String>,
    pub city: Option<String>,
    pub capacity: Option<i64>,
    pub rank: Option<i64>,
    pub points: Option<i64>,
    /// Supplied directly by API-Sports; derived for API-Football.
    pub goal_diff: Option<i64>,
    pub goals_for: Option<i64>,
    pub goals_against: Option<i64>,
    pub win: Option<i64>,
    pub draw: Option<i64>,
    pub lose: Option<i64>,
}

impl RecordDraft {
    /// Names of the mandatory fields this draft is missing, in schema order.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let present = [
            self.team_id.is_some(),
            self.name.is_some(),
            self.rank.is_some(),
            self.points.is_some(),
        ];
        REQUIRED_FIELDS
            .iter()
            .zip(present)
            .filter_map(|(name, present)| (!present).then_some(*name))
            .collect()
    }

    /// Enforce the mandatory-field invariant and apply defaults.
    ///
    /// Counting stats default to 0 when the source did not supply them;
    /// `goal_diff` falls back to `goals_for - goals_against`.
    pub fn finish(self) -> Result<TeamRecord, Vec<&'static str>> {
        let missing = self.missing_required();
        let (Some(team_id), Some(name), Some(rank), Some(points)) =
            (self.team_id, self.name, self.rank, self.points)
        else {
            return Err(missing);
        };

        let goals_for = self.goals_for.unwrap_or(0);
        let goals_against = self.goals_against.unwrap_or(0);

        Ok(TeamRecord {
            team_id,
            name,
            country: self.country,
            founded: self.founded,
            stadium: self.stadium,
            city: self.city,
            capacity: self.capacity,
            rank,
            points,
            goal_diff: self.goal_diff.unwrap_or(goals_for - goals_against),
            goals_for,
            goals_against,
            win: self.win.unwrap_or(0),
            draw: self.draw.unwrap_or(0),
            lose: self.lose.unwrap_or(0),
        })
    }
}
