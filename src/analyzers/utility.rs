//! Numeric helpers shared by the analyzers.
//!
//! Means are anchored on the first value: `a + Σ(v - a) / n`. When every value
//! is identical the result is that value exactly, and the deviations used for
//! the standard deviation are exactly zero.

/// Arithmetic mean. NaN for empty input.
pub fn mean(values: &[f64]) -> f64 {
    let Some(&anchor) = values.first() else {
        return f64::NAN;
    };
    let offset = values.iter().map(|v| v - anchor).sum::<f64>();
    anchor + offset / values.len() as f64
}

/// Sample standard deviation (n - 1) given a pre-computed mean.
/// NaN for fewer than two values.
pub fn sample_stddev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;

    variance.sqrt()
}

/// Result of a weighted mean, keeping the denominator for inspection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedMean {
    pub value: f64,
    pub total_weight: f64,
}

/// `Σ(value × weight) / Σ(weight)` over pairs with a positive, finite weight.
/// The value is NaN when no weight remains.
pub fn weighted_mean<I>(pairs: I) -> WeightedMean
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut anchor = None;
    let mut offset = 0.0;
    let mut total_weight = 0.0;

    for (value, weight) in pairs {
        if !(weight.is_finite() && weight > 0.0) {
            continue;
        }
        let a = *anchor.get_or_insert(value);
        offset += weight * (value - a);
        total_weight += weight;
    }

    let value = match anchor {
        Some(a) => a + offset / total_weight,
        None => f64::NAN,
    };
    WeightedMean {
        value,
        total_weight,
    }
}

/// `stddev / |mean|`; NaN when the mean is zero or either input is NaN.
pub fn coefficient_of_variation(stddev: f64, mean: f64) -> f64 {
    if mean == 0.0 {
        return f64::NAN;
    }
    stddev / mean.abs()
}
