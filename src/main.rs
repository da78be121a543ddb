//! CLI entry point for the lineup rater.
//!
//! Provides subcommands for merging per-interval lineup exports into team
//! tables, analyzing how fast lineup ratings stabilize, rendering charts,
//! and printing the most-used lineups.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use lineup_rater::analyzers::{ConferenceAnalysis, Metric, analyze_conference};
use lineup_rater::config::AppConfig;
use lineup_rater::loader::{ConferenceTables, Loader, discover_teams};
use lineup_rater::output::{self, RunSummary};
use lineup_rater::viz;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "lineup_rater")]
#[command(about = "A tool to measure how quickly lineup ratings stabilize", long_about = None)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CommonArgs {
    /// JSON config file; flags below override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding one subdirectory per team
    #[arg(short = 'd', long, global = true)]
    data_dir: Option<PathBuf>,

    /// Teams to load, comma separated (default: every team directory)
    #[arg(short, long, global = true, value_delimiter = ',')]
    teams: Vec<String>,

    /// Conference roster CSV used to name players
    #[arg(long, global = true)]
    roster: Option<PathBuf>,

    /// Directory to write tables and charts to
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Largest change in running rating still considered stable
    #[arg(long, global = true)]
    threshold: Option<f64>,

    /// Rating to track: net_rating or plusminus_per40
    #[arg(short, long, global = true)]
    metric: Option<Metric>,

    /// Fail on the first malformed row instead of skipping it
    #[arg(long, global = true, default_value_t = false)]
    strict: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write per-team top lineup and progression CSVs
    Merge,
    /// Write lineup stability and stabilization tables plus a run summary
    Analyze,
    /// Render the minutes, stability and stabilization charts
    Plot,
    /// Print lineups that played more than a number of minutes
    Highlight {
        /// Minimum total minutes for a lineup to be listed
        #[arg(short = 'n', long, default_value_t = 50.0)]
        min_minutes: f64,
    },
}

impl CommonArgs {
    fn app_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => AppConfig::default(),
        };

        if let Some(dir) = &self.data_dir {
            config.loader.data_dir = dir.clone();
        }
        if let Some(roster) = &self.roster {
            config.loader.roster = Some(roster.clone());
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(threshold) = self.threshold {
            config.stabilization.threshold = threshold;
        }
        if let Some(metric) = self.metric {
            config.stabilization.metric = metric;
        }
        if self.strict {
            config.loader.strict = true;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_tracing()?;
    let cli = Cli::parse();

    let config = cli.common.app_config()?;
    let teams = if cli.common.teams.is_empty() {
        discover_teams(&config.loader.data_dir).with_context(|| {
            format!("failed to list teams in {}", config.loader.data_dir.display())
        })?
    } else {
        cli.common.teams.clone()
    };
    if teams.is_empty() {
        bail!("no team directories found in {}", config.loader.data_dir.display());
    }

    let loader = Loader::from_config(config.loader.clone())?;
    let tables = loader.load_conference(&teams)?;
    if !tables.rejected.is_empty() {
        warn!(rejected = tables.rejected.len(), "Some rows could not be parsed and were skipped");
    }

    match cli.command {
        Commands::Merge => merge(&config.output_dir, &tables)?,
        Commands::Analyze => {
            let analysis = analyze_conference(&tables.progression, &config.stabilization);
            write_analysis(&config, &teams, &tables, &analysis)?;
        }
        Commands::Plot => {
            let analysis = analyze_conference(&tables.progression, &config.stabilization);
            viz::render_all(
                &config.output_dir,
                &analysis,
                config.stabilization.metric,
                &config.viz,
            )?;
        }
        Commands::Highlight { min_minutes } => {
            let analysis = analyze_conference(&tables.progression, &config.stabilization);
            let rows = output::highlight(&analysis.stability, min_minutes);
            info!(min_minutes, lineups = rows.len(), "Lineups above minutes threshold");
            print!("{}", output::render_table(&rows));
        }
    }

    Ok(())
}

/// Installs a coloured stderr layer and a JSON daily-rolling file layer.
///
/// The returned guard flushes the file writer when dropped.
fn init_tracing() -> Result<WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/lineup_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("lineup_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(file_guard)
}

/// Writes each team's top lineups and progression tables.
#[tracing::instrument(
    skip_all,
    fields(output_dir = %output_dir.display(), teams = tables.teams.len())
)]
fn merge(output_dir: &Path, tables: &ConferenceTables) -> Result<()> {
    for team in &tables.teams {
        let top: Vec<_> = tables
            .top_lineups
            .iter()
            .filter(|r| r.team == team.team)
            .cloned()
            .collect();
        output::write_top_lineups(output_dir, &team.team, &top)?;
        output::write_progression(output_dir, &team.team, &team.progression)?;
    }

    info!(top_lineups = tables.top_lineups.len(), "Merge complete");
    Ok(())
}

/// Writes the stability table, the stabilization table and a JSON summary.
#[tracing::instrument(skip_all, fields(output_dir = %config.output_dir.display()))]
fn write_analysis(
    config: &AppConfig,
    teams: &[String],
    tables: &ConferenceTables,
    analysis: &ConferenceAnalysis,
) -> Result<()> {
    let dir = &config.output_dir;
    output::write_table(dir.join("stability.csv"), &analysis.stability)?;
    output::write_table(dir.join("min_samples.csv"), &analysis.min_samples)?;

    let summary = RunSummary::new(
        teams.to_vec(),
        analysis,
        config.stabilization.metric,
        config.stabilization.threshold,
        tables.rejected.len(),
    );
    output::write_summary(dir.join("summary.json"), &summary)?;

    info!(
        lineups = summary.lineups,
        stabilized = summary.stabilized,
        unresolved = summary.unresolved,
        "Analysis written"
    );
    Ok(())
}
