use lineup_rater::Error;
use lineup_rater::analyzers::{ConferenceAnalysis, Metric, MinimumSample, analyze_conference};
use lineup_rater::config::{LoaderConfig, StabilizationConfig};
use lineup_rater::loader::{ConferenceTables, Interval, Loader};
use lineup_rater::output::{self, RunSummary};
use lineup_rater::viz::{self, VizConfig};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const STARTERS: &str = "ABRO-MCAR-ZDAL-LELL-NFIS";
const BENCH: &str = "IGRA-MCAR-ZDAL-LELL-NFIS";
const PORTLAND: &str = "SING-RHAL-TJOR-VLOW-UKEL";

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn loader() -> Loader {
    let config = LoaderConfig {
        data_dir: fixtures().join("teams"),
        roster: Some(fixtures().join("roster.csv")),
        ..LoaderConfig::default()
    };
    Loader::from_config(config).expect("Failed to build loader")
}

fn load() -> ConferenceTables {
    loader()
        .load_conference(&["Gonzaga", "Portland"])
        .expect("Failed to load fixtures")
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = env::temp_dir().join(format!("lineup_rater_it_{}_{name}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn find<'a>(analysis: &'a ConferenceAnalysis, team: &str, lineup: &str) -> &'a MinimumSample {
    analysis
        .min_samples
        .iter()
        .find(|s| s.team == team && s.lineup.to_string() == lineup)
        .unwrap_or_else(|| panic!("no sample for {team} {lineup}"))
}

#[test]
fn test_load_conference_fixtures() {
    let tables = load();

    assert_eq!(tables.teams.len(), 2);
    // Gonzaga: six interval rows; Portland: three, one malformed row skipped
    assert_eq!(tables.progression.len(), 9);
    assert_eq!(tables.rejected.len(), 1);
    assert_eq!(tables.rejected[0].value, "abc");
    assert_eq!(tables.rejected[0].line, 4);

    let gonzaga_starters: Vec<_> = tables
        .progression
        .iter()
        .filter(|r| r.lineup.to_string() == STARTERS)
        .map(|r| r.interval)
        .collect();
    assert_eq!(
        gonzaga_starters,
        [
            Interval::Split(1),
            Interval::Split(2),
            Interval::Split(3),
            Interval::Split(4)
        ]
    );

    // the season row with a missing player never reaches the top table
    let top: Vec<_> = tables.top_lineups.iter().map(|r| r.lineup.to_string()).collect();
    assert_eq!(top, [STARTERS, BENCH, PORTLAND]);
}

#[test]
fn test_team_without_interval_files_is_not_found() {
    let err = loader().load_team("Pacific").unwrap_err();
    assert!(matches!(err, Error::DataNotFound { team, .. } if team == "Pacific"));

    let err = loader().load_conference(&["Gonzaga", "Pacific"]).unwrap_err();
    assert!(matches!(err, Error::DataNotFound { .. }));
}

#[test]
fn test_strict_load_stops_at_malformed_row() {
    let config = LoaderConfig {
        data_dir: fixtures().join("teams"),
        roster: Some(fixtures().join("roster.csv")),
        strict: true,
        ..LoaderConfig::default()
    };
    let loader = Loader::from_config(config).expect("Failed to build loader");

    assert!(loader.load_team("Gonzaga").is_ok());
    let err = loader.load_team("Portland").unwrap_err();
    assert!(matches!(err, Error::Parse(row) if row.value == "abc" && row.line == 4));
}

#[test]
fn test_full_pipeline() {
    let tables = load();
    let analysis = analyze_conference(&tables.progression, &StabilizationConfig::default());

    assert_eq!(analysis.stability.len(), 3);
    assert_eq!(analysis.min_samples.len(), 3);

    let starters = analysis
        .stability
        .iter()
        .find(|s| s.lineup.to_string() == STARTERS)
        .unwrap();
    assert_eq!(starters.total_minutes, 100.0);
    assert_eq!(starters.intervals, 4);
    assert!((starters.weighted_net_rating - 6.8).abs() < 1e-9);

    let sample = find(&analysis, "Gonzaga", STARTERS);
    assert!(sample.stabilized);
    assert_eq!(sample.stabilization_minutes, 60.0);

    let sample = find(&analysis, "Gonzaga", BENCH);
    assert!(!sample.stabilized);
    assert_eq!(sample.stabilization_minutes, 14.0);

    let sample = find(&analysis, "Portland", PORTLAND);
    assert!(!sample.stabilized);
    assert_eq!(sample.stabilization_minutes, 40.0);

    for sample in &analysis.min_samples {
        assert!(sample.stabilization_minutes <= sample.total_minutes);
    }
}

#[test]
fn test_plus_minus_metric_and_loose_threshold() {
    let tables = load();
    let config = StabilizationConfig {
        threshold: 10.0,
        metric: Metric::PlusminusPer40,
        ..StabilizationConfig::default()
    };
    let analysis = analyze_conference(&tables.progression, &config);

    // every Gonzaga starters interval is +8 per 40, so it settles right away
    let sample = find(&analysis, "Gonzaga", STARTERS);
    assert_eq!(sample.metric, Metric::PlusminusPer40);
    assert!(sample.stabilized);
    assert_eq!(sample.stabilization_minutes, 30.0);
}

#[test]
fn test_outputs_written() {
    let dir = temp_dir("outputs");
    let tables = load();
    let analysis = analyze_conference(&tables.progression, &StabilizationConfig::default());

    let gonzaga = &tables.teams[0];
    let path = output::write_progression(&dir, &gonzaga.team, &gonzaga.progression).unwrap();
    let progression = fs::read_to_string(&path).unwrap();
    let mut lines = progression.lines();
    assert_eq!(
        lines.next(),
        Some("lineup,interval,interval_num,possessions,minutes,plusminus_per40,netrating,plusminus")
    );
    assert_eq!(lines.next(), Some("ABRO-MCAR-ZDAL-LELL-NFIS,Interval 1,1,21.0,10.0,8.0,5.0,2.0"));

    output::write_table(dir.join("stability.csv"), &analysis.stability).unwrap();
    let stability = fs::read_to_string(dir.join("stability.csv")).unwrap();
    assert_eq!(stability.lines().count(), 4);

    let summary = RunSummary::new(
        vec!["Gonzaga".into(), "Portland".into()],
        &analysis,
        Metric::NetRating,
        0.5,
        tables.rejected.len(),
    );
    output::write_summary(dir.join("summary.json"), &summary).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.join("summary.json")).unwrap()).unwrap();
    assert_eq!(json["lineups"], 3);
    assert_eq!(json["stabilized"], 1);
    assert_eq!(json["unresolved"], 2);
    assert_eq!(json["rejected_rows"], 1);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_highlight_and_charts() {
    let dir = temp_dir("charts");
    let tables = load();
    let analysis = analyze_conference(&tables.progression, &StabilizationConfig::default());

    let rows = output::highlight(&analysis.stability, 50.0);
    assert_eq!(rows.len(), 1);
    assert!(output::render_table(&rows).contains(STARTERS));

    let paths = viz::render_all(&dir, &analysis, Metric::NetRating, &VizConfig::default()).unwrap();
    assert_eq!(paths.len(), 3);
    assert!(paths.iter().all(|p| p.exists()));

    fs::remove_dir_all(&dir).unwrap();
}
