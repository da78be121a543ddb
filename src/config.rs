//! Run configuration.
//!
//! Stored as a JSON object on disk; every field is optional and falls back to
//! the defaults below:
//! ```json
//! {
//!   "loader": {
//!     "data_dir": "teams",
//!     "intervals": { "kind": "game_splits", "games_per_split": 10, "total_games": 30 }
//!   },
//!   "stabilization": { "threshold": 1.0, "metric": "plusminus_per40" },
//!   "output_dir": "output"
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analyzers::types::Metric;
use crate::error::{Error, Result};
use crate::viz::VizConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub loader: LoaderConfig,
    pub stabilization: StabilizationConfig,
    pub viz: VizConfig,
    pub output_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            loader: LoaderConfig::default(),
            stabilization: StabilizationConfig::default(),
            viz: VizConfig::default(),
            output_dir: PathBuf::from("output"),
        }
    }
}

impl AppConfig {
    /// Loads and validates the config from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.loader.intervals.validate()?;
        self.stabilization.validate()?;
        if self.viz.histogram_bins == 0 {
            return Err(Error::Config("histogram_bins must be at least 1".into()));
        }
        Ok(())
    }
}

/// Where team files live and how they are named.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub data_dir: PathBuf,
    pub season_file: String,
    pub intervals: IntervalLayout,
    /// Preamble lines before the header row of every export.
    pub skip_rows: usize,
    pub top_lineups_count: usize,
    /// Conference player file; lineups fall back to raw ids without it.
    pub roster: Option<PathBuf>,
    /// Fail the load on the first malformed row instead of skipping it.
    pub strict: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("teams"),
            season_file: "top_lineups.csv".to_string(),
            intervals: IntervalLayout::default(),
            skip_rows: 1,
            top_lineups_count: 12,
            roster: Some(PathBuf::from("wcc_players.csv")),
            strict: false,
        }
    }
}

/// Naming scheme of the per-interval exports inside a team directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntervalLayout {
    /// Explicit file names, numbered in order and labelled `Interval n`.
    Files { names: Vec<String> },
    /// `games_{start}_{end}.csv` chunks covering `total_games`.
    GameSplits {
        games_per_split: u32,
        total_games: u32,
    },
}

impl Default for IntervalLayout {
    fn default() -> Self {
        Self::Files {
            names: (1..=4).map(|i| format!("interval{i}.csv")).collect(),
        }
    }
}

/// One expected interval export.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalFile {
    pub number: u32,
    pub label: String,
    pub file_name: String,
}

impl IntervalLayout {
    pub fn files(&self) -> Vec<IntervalFile> {
        match self {
            Self::Files { names } => names
                .iter()
                .zip(1u32..)
                .map(|(name, number)| IntervalFile {
                    number,
                    label: format!("Interval {number}"),
                    file_name: name.clone(),
                })
                .collect(),
            Self::GameSplits {
                games_per_split,
                total_games,
            } => {
                let step = (*games_per_split).max(1);
                (0..*total_games)
                    .step_by(step as usize)
                    .zip(1u32..)
                    .map(|(offset, number)| {
                        let start = offset + 1;
                        let end = offset + step;
                        IntervalFile {
                            number,
                            label: format!("{start}-{end}"),
                            file_name: format!("games_{start}_{end}.csv"),
                        }
                    })
                    .collect()
            }
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::Files { names } if names.is_empty() => {
                Err(Error::Config("at least one interval file is required".into()))
            }
            Self::GameSplits {
                games_per_split: 0, ..
            } => Err(Error::Config("games_per_split must be at least 1".into())),
            _ => Ok(()),
        }
    }
}

/// How successive running averages are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaKind {
    #[default]
    Absolute,
    /// Change divided by the magnitude of the previous running average.
    Relative,
}

/// Stabilization policy. The threshold has no single correct value, so it is
/// always caller-supplied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizationConfig {
    pub threshold: f64,
    pub metric: Metric,
    pub delta: DeltaKind,
}

impl Default for StabilizationConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            metric: Metric::NetRating,
            delta: DeltaKind::Absolute,
        }
    }
}

impl StabilizationConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(Error::Config(format!(
                "stabilization threshold must be a positive number, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}
