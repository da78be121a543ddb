//! SVG charts of the analysis tables.
//!
//! Three charts are produced: the distribution of minutes played per lineup,
//! a stability scatter of CV against cumulative minutes, and a timeline of
//! stabilization minutes grouped by team.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analyzers::types::{ConferenceAnalysis, Metric, MinimumSample, StabilityStats};
use crate::error::{Error, Result};

type Chart2d<'a, 'b> =
    ChartContext<'a, SVGBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    pub image_size: (u32, u32),
    pub font_size: f64,
    pub histogram_bins: usize,
    pub point_size: u32,
    pub minutes_file: String,
    pub stability_file: String,
    pub timeline_file: String,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            image_size: (1024, 768),
            font_size: 16.0,
            histogram_bins: 20,
            point_size: 4,
            minutes_file: "minutes_histogram.svg".to_string(),
            stability_file: "stability.svg".to_string(),
            timeline_file: "stabilization_timeline.svg".to_string(),
        }
    }
}

impl<E> From<DrawingAreaErrorKind<E>> for Error
where
    E: std::error::Error + Send + Sync,
{
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        Error::Render(e.to_string())
    }
}

/// One equal-width histogram bin, `[start, end)`; the last bin is closed.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width bins over the finite values.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return vec![];
    }

    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = if max > min {
        (max - min) / bins as f64
    } else {
        1.0
    };

    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: min + i as f64 * width,
            end: min + (i + 1) as f64 * width,
            count: 0,
        })
        .collect();
    for v in finite {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

/// Renders all three charts into `dir` and returns their paths.
pub fn render_all(
    dir: impl AsRef<Path>,
    analysis: &ConferenceAnalysis,
    metric: Metric,
    options: &VizConfig,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let minutes = dir.join(&options.minutes_file);
    render_minutes_histogram(&minutes, &analysis.stability, options)?;

    let stability = dir.join(&options.stability_file);
    render_stability_plot(&stability, &analysis.stability, metric, options)?;

    let timeline = dir.join(&options.timeline_file);
    render_stabilization_timeline(&timeline, &analysis.min_samples, options)?;

    let paths = vec![minutes, stability, timeline];
    info!(dir = %dir.display(), charts = paths.len(), "Charts rendered");
    Ok(paths)
}

/// Histogram of total minutes played per lineup.
pub fn render_minutes_histogram(
    path: &Path,
    stats: &[StabilityStats],
    options: &VizConfig,
) -> Result<()> {
    let minutes: Vec<f64> = stats.iter().map(|s| s.total_minutes).collect();
    let bins = histogram(&minutes, options.histogram_bins);
    let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
        return Err(Error::Render("no lineup minutes to plot".into()));
    };
    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(1).max(1);

    let root = SVGBackend::new(path, options.image_size).into_drawing_area();
    root.fill(&WHITE)?;
    {
        let mut chart: Chart2d<'_, '_> = ChartBuilder::on(&root)
            .caption("Minutes played per lineup", ("sans-serif", options.font_size * 1.5))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(50)
            .build_cartesian_2d(first.start..last.end, 0.0..max_count as f64 * 1.1)?;

        chart
            .configure_mesh()
            .x_desc("minutes")
            .y_desc("lineups")
            .label_style(("sans-serif", options.font_size))
            .draw()?;

        chart.draw_series(bins.iter().map(|b| {
            Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], BLUE.mix(0.6).filled())
        }))?;
    }
    root.present()?;
    Ok(())
}

/// Scatter of each lineup's coefficient of variation against the minutes it
/// accumulated, one colour per team. Lineups with an undefined CV are left out.
pub fn render_stability_plot(
    path: &Path,
    stats: &[StabilityStats],
    metric: Metric,
    options: &VizConfig,
) -> Result<()> {
    let points: Vec<(&str, f64, f64)> = stats
        .iter()
        .map(|s| (s.team.as_str(), s.total_minutes, s.cv(metric)))
        .filter(|(_, x, y)| x.is_finite() && y.is_finite())
        .collect();
    if points.is_empty() {
        return Err(Error::Render(format!(
            "no lineup has a defined {metric} coefficient of variation"
        )));
    }

    let max_x = points.iter().map(|p| p.1).fold(0.0, f64::max).max(1.0);
    let max_y = points.iter().map(|p| p.2).fold(0.0, f64::max).max(0.1);

    let root = SVGBackend::new(path, options.image_size).into_drawing_area();
    root.fill(&WHITE)?;
    {
        let mut chart: Chart2d<'_, '_> = ChartBuilder::on(&root)
            .caption(
                format!("Stability of {metric}"),
                ("sans-serif", options.font_size * 1.5),
            )
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(0.0..max_x * 1.05, 0.0..max_y * 1.1)?;

        chart
            .configure_mesh()
            .x_desc("cumulative minutes")
            .y_desc("coefficient of variation")
            .label_style(("sans-serif", options.font_size))
            .draw()?;

        let size = options.point_size as i32;
        for (idx, team) in teams(points.iter().map(|p| p.0)).into_iter().enumerate() {
            let color = Palette99::pick(idx).mix(0.9);
            chart
                .draw_series(
                    points
                        .iter()
                        .filter(|p| p.0 == team)
                        .map(|&(_, x, y)| Circle::new((x, y), size, color.filled())),
                )?
                .label(team)
                .legend(move |(x, y)| Circle::new((x, y), size, color.filled()));
        }

        draw_legend(&mut chart, options)?;
    }
    root.present()?;
    Ok(())
}

/// Stabilization minutes per lineup, grouped by team. Stabilized lineups are
/// filled markers; unresolved ones are hollow and sit at their total minutes.
pub fn render_stabilization_timeline(
    path: &Path,
    samples: &[MinimumSample],
    options: &VizConfig,
) -> Result<()> {
    let mut ordered: Vec<&MinimumSample> = samples
        .iter()
        .filter(|s| s.stabilization_minutes.is_finite())
        .collect();
    if ordered.is_empty() {
        return Err(Error::Render("no stabilization points to plot".into()));
    }
    ordered.sort_by(|a, b| {
        a.team
            .cmp(&b.team)
            .then_with(|| a.stabilization_minutes.total_cmp(&b.stabilization_minutes))
    });

    let max_y = ordered
        .iter()
        .map(|s| s.stabilization_minutes)
        .fold(0.0, f64::max)
        .max(1.0);
    let n = ordered.len() as f64;

    let root = SVGBackend::new(path, options.image_size).into_drawing_area();
    root.fill(&WHITE)?;
    {
        let mut chart: Chart2d<'_, '_> = ChartBuilder::on(&root)
            .caption("Stabilization minutes by lineup", ("sans-serif", options.font_size * 1.5))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5..n - 0.5, 0.0..max_y * 1.1)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(0)
            .x_desc("lineups, grouped by team")
            .y_desc("stabilization minutes")
            .label_style(("sans-serif", options.font_size))
            .draw()?;

        let size = options.point_size as i32;
        for (idx, team) in teams(ordered.iter().map(|s| s.team.as_str())).into_iter().enumerate() {
            let color = Palette99::pick(idx).mix(0.9);
            let positioned: Vec<(f64, &MinimumSample)> = ordered
                .iter()
                .enumerate()
                .filter(|(_, s)| s.team == team)
                .map(|(i, s)| (i as f64, *s))
                .collect();

            for &(x, s) in &positioned {
                chart.draw_series(LineSeries::new(
                    vec![(x, 0.0), (x, s.stabilization_minutes)],
                    color.mix(0.4).stroke_width(1),
                ))?;
            }

            chart
                .draw_series(positioned.iter().map(|&(x, s)| {
                    let style = if s.stabilized {
                        color.filled()
                    } else {
                        color.stroke_width(2)
                    };
                    Circle::new((x, s.stabilization_minutes), size, style)
                }))?
                .label(team)
                .legend(move |(x, y)| Circle::new((x, y), size, color.filled()));
        }

        draw_legend(&mut chart, options)?;
    }
    root.present()?;
    Ok(())
}

fn draw_legend<'a, 'b: 'a>(chart: &mut Chart2d<'a, 'b>, options: &VizConfig) -> Result<()> {
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .label_font(("sans-serif", options.font_size))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

/// Distinct team names in sorted order; fixes each team's palette slot.
fn teams<'a>(names: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    names.collect::<BTreeSet<_>>().into_iter().collect()
}
