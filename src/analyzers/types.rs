//! Data types produced by the analysis pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::loader::{Interval, LineupRecord};
use crate::output::nan_as_empty;
use crate::roster::Lineup;

/// A per-interval rating that can be weighted and tracked for stability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    NetRating,
    PlusminusPer40,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::NetRating, Metric::PlusminusPer40];

    pub fn value(self, record: &LineupRecord) -> f64 {
        match self {
            Self::NetRating => record.net_rating,
            Self::PlusminusPer40 => record.plusminus_per40,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NetRating => "net_rating",
            Self::PlusminusPer40 => "plusminus_per40",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "net_rating" | "netrating" => Ok(Self::NetRating),
            "plusminus_per40" | "plus_minus_per40" => Ok(Self::PlusminusPer40),
            other => Err(format!(
                "unknown metric {other:?}, expected net_rating or plusminus_per40"
            )),
        }
    }
}

/// Weighted ratings and their variability for one lineup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StabilityStats {
    pub team: String,
    pub lineup: Lineup,
    /// Interval records with positive minutes.
    pub intervals: usize,
    /// Sum of minutes; also the denominator of both weighted averages.
    pub total_minutes: f64,
    #[serde(serialize_with = "nan_as_empty")]
    pub weighted_net_rating: f64,
    #[serde(serialize_with = "nan_as_empty")]
    pub weighted_plusminus_per40: f64,
    #[serde(serialize_with = "nan_as_empty")]
    pub cv_net_rating: f64,
    #[serde(serialize_with = "nan_as_empty")]
    pub cv_plusminus_per40: f64,
}

impl StabilityStats {
    pub fn weighted(&self, metric: Metric) -> f64 {
        match metric {
            Metric::NetRating => self.weighted_net_rating,
            Metric::PlusminusPer40 => self.weighted_plusminus_per40,
        }
    }

    pub fn cv(&self, metric: Metric) -> f64 {
        match metric {
            Metric::NetRating => self.cv_net_rating,
            Metric::PlusminusPer40 => self.cv_plusminus_per40,
        }
    }
}

/// Cumulative minutes a lineup needed before its running rating settled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinimumSample {
    pub team: String,
    pub lineup: Lineup,
    pub metric: Metric,
    /// Total observed minutes when `stabilized` is false.
    pub stabilization_minutes: f64,
    pub stabilized: bool,
    pub total_minutes: f64,
}

/// Running weighted average after one more interval.
#[derive(Debug, Clone, PartialEq)]
pub struct RunningPoint {
    pub interval: Interval,
    pub cumulative_minutes: f64,
    pub running_average: f64,
    /// Change from the previous point, absolute or relative; `None` first.
    pub delta: Option<f64>,
}

/// Both output tables of [`analyze_conference`](crate::analyzers::analyze_conference),
/// ordered by team then lineup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConferenceAnalysis {
    pub stability: Vec<StabilityStats>,
    pub min_samples: Vec<MinimumSample>,
}

impl ConferenceAnalysis {
    pub fn stabilized_count(&self) -> usize {
        self.min_samples.iter().filter(|m| m.stabilized).count()
    }
}
