//! Lineup stability analysis.
//!
//! Groups the progression table by (team, lineup), computes minutes-weighted
//! ratings and their coefficient of variation, and finds the cumulative
//! minutes after which a lineup's running rating stops moving.

pub mod aggregate;
pub mod analyzer;
pub mod stabilization;
pub mod types;
pub mod utility;

pub use analyzer::analyze_conference;
pub use types::{ConferenceAnalysis, Metric, MinimumSample, RunningPoint, StabilityStats};
