//! Per-team lineup export loading.
//!
//! A team directory holds one season export plus one export per interval of
//! the season. The loader turns them into a progression table (all interval
//! rows) and a season "top lineups" table. Rows with unreadable numbers are
//! skipped and reported; a team with no usable files fails as a whole.

mod table;
pub mod types;

use std::path::Path;

use tracing::{info, warn};

use crate::config::LoaderConfig;
use crate::error::{Error, Result};
use crate::roster::Roster;
use table::{Source, read_export};
pub use types::{ConferenceTables, Interval, LineupRecord, TeamTables};

pub struct Loader {
    config: LoaderConfig,
    roster: Roster,
}

impl Loader {
    pub fn new(config: LoaderConfig, roster: Roster) -> Self {
        Self { config, roster }
    }

    /// Builds a loader, reading the configured roster when it exists.
    pub fn from_config(config: LoaderConfig) -> Result<Self> {
        let roster = match &config.roster {
            Some(path) if path.exists() => Roster::load(path)?,
            Some(path) => {
                warn!(
                    path = %path.display(),
                    "Roster file not found, lineups will use raw player ids"
                );
                Roster::default()
            }
            None => Roster::default(),
        };
        Ok(Self::new(config, roster))
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Loads the season export and every interval export of one team.
    ///
    /// # Errors
    ///
    /// [`Error::DataNotFound`] when the team directory, its season file, or
    /// all of its interval files are missing. Missing individual interval
    /// files are only logged.
    #[tracing::instrument(skip(self), fields(data_dir = %self.config.data_dir.display()))]
    pub fn load_team(&self, team: &str) -> Result<TeamTables> {
        let team_dir = self.config.data_dir.join(team);
        if !team_dir.is_dir() {
            return Err(not_found(team, format!("{} is not a directory", team_dir.display())));
        }

        let season_path = team_dir.join(&self.config.season_file);
        if !season_path.is_file() {
            return Err(not_found(team, format!("missing {}", season_path.display())));
        }

        let expected = self.config.intervals.files();
        let present: Vec<_> = expected
            .iter()
            .filter_map(|file| {
                let path = team_dir.join(&file.file_name);
                if path.is_file() {
                    Some((file, path))
                } else {
                    warn!(path = %path.display(), "Interval file missing, skipping");
                    None
                }
            })
            .collect();
        if present.is_empty() {
            return Err(not_found(
                team,
                format!(
                    "none of the {} interval files exist in {}",
                    expected.len(),
                    team_dir.display()
                ),
            ));
        }

        let mut tables = TeamTables {
            team: team.to_string(),
            ..TeamTables::default()
        };

        let season_source = Source {
            path: &season_path,
            team,
            interval: Interval::Season,
            label: "Season",
        };
        let (season, rejected) = read_export(&season_source, &self.config, &self.roster)?;
        tables.season = season;
        tables.rejected.extend(rejected);

        for (file, path) in &present {
            let source = Source {
                path,
                team,
                interval: Interval::Split(file.number),
                label: &file.label,
            };
            let (rows, rejected) = read_export(&source, &self.config, &self.roster)?;
            tables.progression.extend(rows);
            tables.rejected.extend(rejected);
        }

        info!(
            team,
            season_rows = tables.season.len(),
            interval_files = present.len(),
            progression_rows = tables.progression.len(),
            rejected = tables.rejected.len(),
            "Team loaded"
        );
        Ok(tables)
    }

    /// Loads every team in `teams`, concatenating their tables.
    ///
    /// Fails on the first team without data; no partial table is returned.
    pub fn load_conference<S: AsRef<str>>(&self, teams: &[S]) -> Result<ConferenceTables> {
        let mut conference = ConferenceTables::default();
        for team in teams {
            let tables = self.load_team(team.as_ref())?;
            conference.progression.extend(tables.progression.iter().cloned());
            conference
                .top_lineups
                .extend(tables.top_lineups(self.config.top_lineups_count));
            conference.rejected.extend(tables.rejected.iter().cloned());
            conference.teams.push(tables);
        }

        info!(
            teams = conference.teams.len(),
            progression_rows = conference.progression.len(),
            top_lineups = conference.top_lineups.len(),
            rejected = conference.rejected.len(),
            "Conference loaded"
        );
        Ok(conference)
    }
}

/// Lists team directories under `data_dir`, sorted by name.
pub fn discover_teams(data_dir: impl AsRef<Path>) -> Result<Vec<String>> {
    let mut teams = Vec::new();
    for entry in std::fs::read_dir(data_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                teams.push(name.to_string());
            }
        }
    }
    teams.sort();
    Ok(teams)
}

fn not_found(team: &str, reason: String) -> Error {
    Error::DataNotFound {
        team: team.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IntervalLayout;
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    const HEADER: &str = "PID1,PID2,PID3,PID4,PID5,POSS,MP*,PLUS-MINUS,NET RTG,ORTG,DRTG";

    fn temp_dir(name: &str) -> PathBuf {
        let dir =
            env::temp_dir().join(format!("lineup_rater_loader_{}_{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_export(dir: &Path, name: &str, rows: &[&str]) {
        let mut content = format!("report\n{HEADER}\n");
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        fs::write(dir.join(name), content).unwrap();
    }

    fn loader(data_dir: &Path) -> Loader {
        let config = LoaderConfig {
            data_dir: data_dir.to_path_buf(),
            roster: None,
            top_lineups_count: 2,
            intervals: IntervalLayout::Files {
                names: vec!["interval1.csv".into(), "interval2.csv".into()],
            },
            ..LoaderConfig::default()
        };
        Loader::new(config, Roster::default())
    }

    #[test]
    fn test_load_team_reads_season_and_intervals() {
        let data_dir = temp_dir("team");
        let team_dir = data_dir.join("Gonzaga");
        fs::create_dir_all(&team_dir).unwrap();
        write_export(&team_dir, "top_lineups.csv", &["1,2,3,4,5,90,45,12,10.0,,"]);
        write_export(&team_dir, "interval1.csv", &["1,2,3,4,5,30,15,4,8.0,,"]);
        write_export(&team_dir, "interval2.csv", &["5,4,3,2,1,60,30,8,11.0,,"]);

        let tables = loader(&data_dir).load_team("Gonzaga").unwrap();
        fs::remove_dir_all(&data_dir).unwrap();

        assert_eq!(tables.season.len(), 1);
        assert_eq!(tables.season[0].interval, Interval::Season);
        assert_eq!(tables.progression.len(), 2);
        assert_eq!(tables.progression[0].interval, Interval::Split(1));
        assert_eq!(tables.progression[1].interval, Interval::Split(2));
        assert_eq!(tables.progression[0].lineup, tables.progression[1].lineup);
    }

    #[test]
    fn test_load_team_tolerates_one_missing_interval() {
        let data_dir = temp_dir("partial");
        let team_dir = data_dir.join("Pepperdine");
        fs::create_dir_all(&team_dir).unwrap();
        write_export(&team_dir, "top_lineups.csv", &["1,2,3,4,5,90,45,12,10.0,,"]);
        write_export(&team_dir, "interval2.csv", &["1,2,3,4,5,60,30,8,11.0,,"]);

        let tables = loader(&data_dir).load_team("Pepperdine").unwrap();
        fs::remove_dir_all(&data_dir).unwrap();

        assert_eq!(tables.progression.len(), 1);
        assert_eq!(tables.progression[0].interval_label, "Interval 2");
    }

    #[test]
    fn test_load_team_without_intervals_is_not_found() {
        let data_dir = temp_dir("no_intervals");
        let team_dir = data_dir.join("Portland");
        fs::create_dir_all(&team_dir).unwrap();
        write_export(&team_dir, "top_lineups.csv", &["1,2,3,4,5,90,45,12,10.0,,"]);

        let err = loader(&data_dir).load_team("Portland").unwrap_err();
        fs::remove_dir_all(&data_dir).unwrap();

        assert!(matches!(err, Error::DataNotFound { team, .. } if team == "Portland"));
    }

    #[test]
    fn test_load_conference_fails_without_partial_table() {
        let data_dir = temp_dir("conference");
        let team_dir = data_dir.join("Gonzaga");
        fs::create_dir_all(&team_dir).unwrap();
        write_export(&team_dir, "top_lineups.csv", &["1,2,3,4,5,90,45,12,10.0,,"]);
        write_export(&team_dir, "interval1.csv", &["1,2,3,4,5,30,15,4,8.0,,"]);

        let result = loader(&data_dir).load_conference(&["Gonzaga", "Missing"]);
        fs::remove_dir_all(&data_dir).unwrap();

        assert!(matches!(result, Err(Error::DataNotFound { team, .. }) if team == "Missing"));
    }

    #[test]
    fn test_top_lineups_excludes_unknown_and_orders_by_possessions() {
        let data_dir = temp_dir("top");
        let team_dir = data_dir.join("Gonzaga");
        fs::create_dir_all(&team_dir).unwrap();
        write_export(
            &team_dir,
            "top_lineups.csv",
            &[
                "1,2,3,4,5,50,25,1,1.0,,",
                "1,2,3,4,,200,80,1,1.0,,",
                "1,2,3,4,6,120,60,1,1.0,,",
                "1,2,3,4,7,,10,1,1.0,,",
                "1,2,3,4,8,80,40,1,1.0,,",
            ],
        );
        write_export(&team_dir, "interval1.csv", &["1,2,3,4,5,30,15,4,8.0,,"]);

        let conference = loader(&data_dir).load_conference(&["Gonzaga"]).unwrap();
        fs::remove_dir_all(&data_dir).unwrap();

        let top: Vec<_> = conference.top_lineups.iter().map(|r| r.possessions).collect();
        assert_eq!(top, [Some(120.0), Some(80.0)]);
    }

    #[test]
    fn test_discover_teams_sorted() {
        let data_dir = temp_dir("discover");
        fs::create_dir_all(data_dir.join("Santa Clara")).unwrap();
        fs::create_dir_all(data_dir.join("Gonzaga")).unwrap();
        fs::write(data_dir.join("notes.txt"), "x").unwrap();

        let teams = discover_teams(&data_dir).unwrap();
        fs::remove_dir_all(&data_dir).unwrap();

        assert_eq!(teams, ["Gonzaga", "Santa Clara"]);
    }
}
