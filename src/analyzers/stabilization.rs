//! Stabilization point of a lineup's running rating.
//!
//! After each interval the running minutes-weighted average is recomputed.
//! A lineup has stabilized at the earliest cumulative-minutes mark after
//! which every remaining change in that average stays below the threshold.

use crate::analyzers::types::{Metric, MinimumSample, RunningPoint};
use crate::config::{DeltaKind, StabilizationConfig};
use crate::loader::LineupRecord;

/// Running weighted averages of `metric`, one point per interval with
/// positive minutes. `records` must be in interval order.
pub fn running_averages(
    records: &[&LineupRecord],
    metric: Metric,
    kind: DeltaKind,
) -> Vec<RunningPoint> {
    let mut points: Vec<RunningPoint> = Vec::with_capacity(records.len());
    let mut anchor = None;
    let mut offset = 0.0;
    let mut cumulative = 0.0;

    for record in records.iter().filter(|r| r.has_minutes()) {
        let value = metric.value(record);
        let a = *anchor.get_or_insert(value);
        offset += record.minutes * (value - a);
        cumulative += record.minutes;
        let running_average = a + offset / cumulative;

        let delta = points.last().map(|prev| {
            let change = (running_average - prev.running_average).abs();
            match kind {
                DeltaKind::Absolute => change,
                // An unchanged average is stable even at zero; any move away
                // from zero is an infinite relative change.
                DeltaKind::Relative if change == 0.0 => 0.0,
                DeltaKind::Relative => change / prev.running_average.abs(),
            }
        });

        points.push(RunningPoint {
            interval: record.interval,
            cumulative_minutes: cumulative,
            running_average,
            delta,
        });
    }

    points
}

/// Finds where the running average settles.
///
/// Scans the deltas backwards for the longest trailing run below the
/// threshold; the stabilization minute is the cumulative minutes of the
/// first point in that run. With no such run (including a lineup with a
/// single interval) the lineup is unresolved and reports its total minutes.
pub fn stabilization_point(
    records: &[&LineupRecord],
    config: &StabilizationConfig,
) -> Option<MinimumSample> {
    let first = records.first()?;
    let points = running_averages(records, config.metric, config.delta);
    let total_minutes = points.last().map_or(0.0, |p| p.cumulative_minutes);

    let settled_from = points
        .iter()
        .enumerate()
        .skip(1)
        .rev()
        .take_while(|(_, p)| p.delta.is_some_and(|d| d < config.threshold))
        .last()
        .map(|(idx, _)| idx);

    let (stabilization_minutes, stabilized) = match settled_from {
        Some(idx) => (points[idx].cumulative_minutes, true),
        None => (total_minutes, false),
    };

    Some(MinimumSample {
        team: first.team.clone(),
        lineup: first.lineup.clone(),
        metric: config.metric,
        stabilization_minutes,
        stabilized,
        total_minutes,
    })
}
