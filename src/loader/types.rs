//! Tables produced by the loader.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::RowError;
use crate::roster::Lineup;

/// Which slice of the season a record covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Interval {
    /// 1-based interval ordinal; later intervals cover later games.
    Split(u32),
    Season,
}

impl Interval {
    pub fn number(&self) -> Option<u32> {
        match self {
            Self::Split(n) => Some(*n),
            Self::Season => None,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Split(n) => write!(f, "{n}"),
            Self::Season => f.write_str("season"),
        }
    }
}

impl Serialize for Interval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Split(n) => serializer.serialize_u32(*n),
            Self::Season => serializer.serialize_str("season"),
        }
    }
}

/// One lineup row from one export file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineupRecord {
    pub team: String,
    pub lineup: Lineup,
    pub interval: Interval,
    pub interval_label: String,
    pub minutes: f64,
    pub net_rating: f64,
    pub plus_minus: f64,
    /// `plus_minus / minutes * 40`; NaN for a zero-minute row.
    pub plusminus_per40: f64,
    pub possessions: Option<f64>,
    pub off_rating: Option<f64>,
    pub def_rating: Option<f64>,
}

impl LineupRecord {
    /// Whether the record can carry weight in a minutes-weighted average.
    pub fn has_minutes(&self) -> bool {
        self.minutes.is_finite() && self.minutes > 0.0
    }
}

/// Everything loaded for one team.
#[derive(Debug, Clone, Default)]
pub struct TeamTables {
    pub team: String,
    pub season: Vec<LineupRecord>,
    pub progression: Vec<LineupRecord>,
    pub rejected: Vec<RowError>,
}

impl TeamTables {
    /// Season lineups with every player identified, most possessions first.
    pub fn top_lineups(&self, count: usize) -> Vec<LineupRecord> {
        let mut rows: Vec<_> = self
            .season
            .iter()
            .filter(|r| !r.lineup.has_unknown())
            .cloned()
            .collect();
        // Rows without possessions go last, like a NaN sort key would.
        rows.sort_by(|a, b| match (a.possessions, b.possessions) {
            (Some(pa), Some(pb)) => pb.total_cmp(&pa),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        rows.truncate(count);
        rows
    }
}

/// Tables for every requested team, concatenated in request order.
#[derive(Debug, Clone, Default)]
pub struct ConferenceTables {
    pub teams: Vec<TeamTables>,
    pub progression: Vec<LineupRecord>,
    pub top_lineups: Vec<LineupRecord>,
    pub rejected: Vec<RowError>,
}
