//! Output formatting and persistence for lineup tables.
//!
//! Supports CSV export of the loader and analyzer tables, a JSON run summary,
//! and a fixed-width text table of the lineups above a minutes threshold.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::{Serialize, Serializer};
use tracing::{debug, info};

use crate::analyzers::types::{ConferenceAnalysis, Metric, StabilityStats};
use crate::error::Result;
use crate::loader::LineupRecord;
use crate::roster::Lineup;

/// Writes NaN and infinities as an empty CSV cell (`null` in JSON).
pub fn nan_as_empty<S: Serializer>(
    value: &f64,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.serialize_none()
    }
}

fn round2(value: f64) -> Option<f64> {
    value.is_finite().then(|| (value * 100.0).round() / 100.0)
}

#[derive(Serialize)]
struct TopLineupRow<'a> {
    lineup: &'a Lineup,
    possessions: Option<f64>,
    minutes: Option<f64>,
    plusminus: Option<f64>,
    plusminus_per40: Option<f64>,
    netrating: Option<f64>,
    offrating: Option<f64>,
    defrating: Option<f64>,
}

impl<'a> From<&'a LineupRecord> for TopLineupRow<'a> {
    fn from(r: &'a LineupRecord) -> Self {
        Self {
            lineup: &r.lineup,
            possessions: r.possessions.and_then(round2),
            minutes: round2(r.minutes),
            plusminus: round2(r.plus_minus),
            plusminus_per40: round2(r.plusminus_per40),
            netrating: round2(r.net_rating),
            offrating: r.off_rating.and_then(round2),
            defrating: r.def_rating.and_then(round2),
        }
    }
}

#[derive(Serialize)]
struct ProgressionRow<'a> {
    lineup: &'a Lineup,
    interval: &'a str,
    interval_num: Option<u32>,
    possessions: Option<f64>,
    minutes: Option<f64>,
    plusminus_per40: Option<f64>,
    netrating: Option<f64>,
    plusminus: Option<f64>,
}

impl<'a> From<&'a LineupRecord> for ProgressionRow<'a> {
    fn from(r: &'a LineupRecord) -> Self {
        Self {
            lineup: &r.lineup,
            interval: &r.interval_label,
            interval_num: r.interval.number(),
            possessions: r.possessions.and_then(round2),
            minutes: round2(r.minutes),
            plusminus_per40: round2(r.plusminus_per40),
            netrating: round2(r.net_rating),
            plusminus: round2(r.plus_minus),
        }
    }
}

/// Writes `rows` as a CSV table at `path`, replacing any existing file.
pub fn write_table<T: Serialize>(
    path: impl AsRef<Path>,
    rows: impl IntoIterator<Item = T>,
) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = WriterBuilder::new().from_writer(File::create(path)?);
    let mut count = 0usize;
    for row in rows {
        writer.serialize(row)?;
        count += 1;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = count, "CSV table written");
    Ok(())
}

/// Writes `<dir>/<team>_top_lineups.csv`, numbers rounded to 2 decimals.
pub fn write_top_lineups(
    dir: impl AsRef<Path>,
    team: &str,
    rows: &[LineupRecord],
) -> Result<PathBuf> {
    let path = dir.as_ref().join(format!("{team}_top_lineups.csv"));
    write_table(&path, rows.iter().map(TopLineupRow::from))?;
    info!(path = %path.display(), "Top lineups saved");
    Ok(path)
}

/// Writes `<dir>/<team>_progression.csv`, numbers rounded to 2 decimals.
pub fn write_progression(
    dir: impl AsRef<Path>,
    team: &str,
    rows: &[LineupRecord],
) -> Result<PathBuf> {
    let path = dir.as_ref().join(format!("{team}_progression.csv"));
    write_table(&path, rows.iter().map(ProgressionRow::from))?;
    info!(path = %path.display(), "Progression data saved");
    Ok(path)
}

/// Top-level description of one analysis run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub teams: Vec<String>,
    pub metric: Metric,
    pub threshold: f64,
    pub lineups: usize,
    pub stabilized: usize,
    pub unresolved: usize,
    pub rejected_rows: usize,
}

impl RunSummary {
    pub fn new(
        teams: Vec<String>,
        analysis: &ConferenceAnalysis,
        metric: Metric,
        threshold: f64,
        rejected_rows: usize,
    ) -> Self {
        let stabilized = analysis.stabilized_count();
        Self {
            generated_at: Utc::now(),
            teams,
            metric,
            threshold,
            lineups: analysis.stability.len(),
            stabilized,
            unresolved: analysis.min_samples.len() - stabilized,
            rejected_rows,
        }
    }
}

/// Writes `summary` as pretty-printed JSON.
pub fn write_summary(path: impl AsRef<Path>, summary: &RunSummary) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, serde_json::to_string_pretty(summary)?)?;
    debug!(path = %path.display(), "Summary written");
    Ok(())
}

/// Lineups that played more than `min_minutes`, most minutes first.
pub fn highlight(stats: &[StabilityStats], min_minutes: f64) -> Vec<&StabilityStats> {
    let mut rows: Vec<_> = stats.iter().filter(|s| s.total_minutes > min_minutes).collect();
    rows.sort_by(|a, b| {
        b.total_minutes
            .total_cmp(&a.total_minutes)
            .then_with(|| a.team.cmp(&b.team))
            .then_with(|| a.lineup.cmp(&b.lineup))
    });
    rows
}

/// Formats rows as a fixed-width text table. Undefined values print as `-`.
pub fn render_table(rows: &[&StabilityStats]) -> String {
    let fmt = |v: f64| if v.is_finite() { format!("{v:.2}") } else { "-".to_string() };

    let header = ["team", "lineup", "minutes", "net_rtg", "pm_per40", "cv_net", "cv_pm40"];
    let body: Vec<[String; 7]> = rows
        .iter()
        .map(|s| {
            [
                s.team.clone(),
                s.lineup.to_string(),
                fmt(s.total_minutes),
                fmt(s.weighted_net_rating),
                fmt(s.weighted_plusminus_per40),
                fmt(s.cv_net_rating),
                fmt(s.cv_plusminus_per40),
            ]
        })
        .collect();

    let mut widths = header.map(str::len);
    for row in &body {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(i, (cell, width))| {
                // text columns left-aligned, numbers right-aligned
                if i < 2 {
                    format!("{cell:<width$}")
                } else {
                    format!("{cell:>width$}")
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = line(&header.map(String::from));
    out.push('\n');
    for row in &body {
        out.push_str(&line(row));
        out.push('\n');
    }
    out
}
