use crate::analyzers::types::{Metric, StabilityStats};
use crate::analyzers::utility::{coefficient_of_variation, mean, sample_stddev, weighted_mean};
use crate::loader::LineupRecord;

/// Aggregates one lineup's interval records into a [`StabilityStats`] row.
///
/// Records without positive minutes carry no weight and are ignored for
/// both the weighted averages and the per-interval spread. All records are
/// expected to share the same (team, lineup) key.
pub fn aggregate_lineup(records: &[&LineupRecord]) -> Option<StabilityStats> {
    let first = records.first()?;
    debug_assert!(
        records
            .iter()
            .all(|r| r.team == first.team && r.lineup == first.lineup),
        "records must share one (team, lineup) key"
    );

    let weighted: Vec<&LineupRecord> =
        records.iter().copied().filter(|r| r.has_minutes()).collect();

    let summarize = |metric: Metric| {
        let avg = weighted_mean(weighted.iter().map(|r| (metric.value(r), r.minutes)));
        let values: Vec<f64> = weighted.iter().map(|r| metric.value(r)).collect();
        let sd = sample_stddev(&values, mean(&values));
        (avg, coefficient_of_variation(sd, avg.value))
    };

    let (net, cv_net) = summarize(Metric::NetRating);
    let (pm40, cv_pm40) = summarize(Metric::PlusminusPer40);

    Some(StabilityStats {
        team: first.team.clone(),
        lineup: first.lineup.clone(),
        intervals: weighted.len(),
        total_minutes: net.total_weight,
        weighted_net_rating: net.value,
        weighted_plusminus_per40: pm40.value,
        cv_net_rating: cv_net,
        cv_plusminus_per40: cv_pm40,
    })
}
