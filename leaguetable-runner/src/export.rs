//! Export helpers — CSV dumps and the Polars frame fed to the warehouse.

use anyhow::{Context, Result};
use leaguetable_core::TeamRecord;
use polars::prelude::*;
use std::path::Path;

/// Build the warehouse frame for a set of unified records, one row per team.
///
/// Optional fields become nullable columns; mandatory fields are non-null by
/// construction.
pub fn records_to_dataframe(records: &[TeamRecord]) -> Result<DataFrame> {
    let team_ids: Vec<i64> = records.iter().map(|r| r.team_id).collect();
    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    let countries: Vec<Option<&str>> = records.iter().map(|r| r.country.as_deref()).collect();
    let founded: Vec<Option<i64>> = records.iter().map(|r| r.founded).collect();
    let stadiums: Vec<Option<&str>> = records.iter().map(|r| r.stadium.as_deref()).collect();
    let cities: Vec<Option<&str>> = records.iter().map(|r| r.city.as_deref()).collect();
    let capacities: Vec<Option<i64>> = records.iter().map(|r| r.capacity).collect();
    let ranks: Vec<i64> = records.iter().map(|r| r.rank).collect();
    let points: Vec<i64> = records.iter().map(|r| r.points).collect();
    let goal_diffs: Vec<i64> = records.iter().map(|r| r.goal_diff).collect();
    let goals_for: Vec<i64> = records.iter().map(|r| r.goals_for).collect();
    let goals_against: Vec<i64> = records.iter().map(|r| r.goals_against).collect();
    let wins: Vec<i64> = records.iter().map(|r| r.win).collect();
    let draws: Vec<i64> = records.iter().map(|r| r.draw).collect();
    let losses: Vec<i64> = records.iter().map(|r| r.lose).collect();

    DataFrame::new(vec![
        Column::new("team_id".into(), team_ids),
        Column::new("name".into(), names),
        Column::new("country".into(), countries),
        Column::new("founded".into(), founded),
        Column::new("stadium".into(), stadiums),
        Column::new("city".into(), cities),
        Column::new("capacity".into(), capacities),
        Column::new("rank".into(), ranks),
        Column::new("points".into(), points),
        Column::new("goal_diff".into(), goal_diffs),
        Column::new("goals_for".into(), goals_for),
        Column::new("goals_against".into(), goals_against),
        Column::new("win".into(), wins),
        Column::new("draw".into(), draws),
        Column::new("lose".into(), losses),
    ])
    .context("failed to build team records dataframe")
}

/// Dump unified records to a CSV file for external inspection.
pub fn write_records_csv(records: &[TeamRecord], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("failed to open {} for writing", path.display()))?;
    for record in records {
        wtr.serialize(record).context("failed to write CSV row")?;
    }
    wtr.flush().context("failed to flush CSV writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(team_id: i64, name: &str, rank: i64) -> TeamRecord {
        TeamRecord {
            team_id,
            name: name.to_string(),
            country: Some("England".to_string()),
            founded: Some(1886),
            stadium: None,
            city: None,
            capacity: None,
            rank,
            points: 84,
            goal_diff: 59,
            goals_for: 88,
            goals_against: 29,
            win: 26,
            draw: 6,
            lose: 6,
        }
    }

    #[test]
    fn dataframe_has_one_row_per_record_and_all_columns() {
        let df = records_to_dataframe(&[record(10, "Arsenal", 1), record(20, "Everton", 15)])
            .unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 15);
        assert_eq!(
            df.get_column_names_str(),
            vec![
                "team_id",
                "name",
                "country",
                "founded",
                "stadium",
                "city",
                "capacity",
                "rank",
                "points",
                "goal_diff",
                "goals_for",
                "goals_against",
                "win",
                "draw",
                "lose"
            ]
        );
        assert_eq!(df.column("stadium").unwrap().null_count(), 2);
    }

    #[test]
    fn empty_record_set_builds_an_empty_frame() {
        let df = records_to_dataframe(&[]).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 15);
    }

    #[test]
    fn csv_export_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("teams.csv");
        let records = vec![record(10, "Arsenal", 1)];

        write_records_csv(&records, &path).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let read: Vec<TeamRecord> = rdr.deserialize().map(Result::unwrap).collect();
        assert_eq!(read, records);
    }
}
