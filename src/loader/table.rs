//! Parsing of a single lineup export.

use std::path::Path;

use csv::StringRecord;
use tracing::{debug, warn};

use crate::config::LoaderConfig;
use crate::error::{Error, Result, RowError};
use crate::loader::types::{Interval, LineupRecord};
use crate::roster::Roster;

const PLAYER_COLUMNS: [&str; 5] = ["PID1", "PID2", "PID3", "PID4", "PID5"];
/// Minutes are exported as `MP*` or, in play-by-play exports, `MINSPBP`.
const MINUTES_COLUMNS: [&str; 2] = ["MP*", "MINSPBP"];

/// Column positions of one export, resolved from its header row.
#[derive(Debug)]
struct Columns {
    players: [usize; 5],
    minutes: usize,
    plus_minus: usize,
    net_rating: usize,
    possessions: Option<usize>,
    off_rating: Option<usize>,
    def_rating: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord, path: &Path) -> Result<Self> {
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_uppercase()).collect();
        let find = |name: &str| names.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| Error::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            })
        };

        let mut players = [0; 5];
        for (slot, name) in players.iter_mut().zip(PLAYER_COLUMNS) {
            *slot = require(name)?;
        }

        let minutes = MINUTES_COLUMNS
            .iter()
            .find_map(|&name| find(name))
            .ok_or_else(|| Error::MissingColumn {
                path: path.to_path_buf(),
                column: MINUTES_COLUMNS.join(" or "),
            })?;

        Ok(Self {
            players,
            minutes,
            plus_minus: require("PLUS-MINUS")?,
            net_rating: require("NET RTG")?,
            possessions: find("POSS"),
            off_rating: find("ORTG"),
            def_rating: find("DRTG"),
        })
    }
}

/// Identity shared by every row of one file.
pub(crate) struct Source<'a> {
    pub path: &'a Path,
    pub team: &'a str,
    pub interval: Interval,
    pub label: &'a str,
}

/// Reads one export. Rows with unreadable numbers are returned as
/// [`RowError`]s instead of records, or fail the read as [`Error::Parse`]
/// when `config.strict` is set; a missing required column fails the whole
/// file.
pub(crate) fn read_export(
    source: &Source<'_>,
    config: &LoaderConfig,
    roster: &Roster,
) -> Result<(Vec<LineupRecord>, Vec<RowError>)> {
    let skip_rows = config.skip_rows;
    let content = std::fs::read_to_string(source.path)?;
    let body = skip_lines(content.trim_start_matches('\u{feff}'), skip_rows);

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(body.as_bytes());
    let columns = Columns::resolve(rdr.headers()?, source.path)?;

    let mut records = Vec::new();
    let mut rejected = Vec::new();
    for result in rdr.records() {
        let row = result?;
        if row.iter().all(str::is_empty) {
            continue;
        }
        let line = row.position().map_or(0, |p| p.line()) + skip_rows as u64;
        match parse_row(&row, &columns, source, roster, line) {
            Ok(record) => records.push(record),
            Err(e) if config.strict => return Err(e.into()),
            Err(e) => {
                warn!(error = %e, "Skipping malformed row");
                rejected.push(e);
            }
        }
    }

    debug!(
        path = %source.path.display(),
        rows = records.len(),
        rejected = rejected.len(),
        "Export parsed"
    );
    Ok((records, rejected))
}

fn parse_row(
    row: &StringRecord,
    columns: &Columns,
    source: &Source<'_>,
    roster: &Roster,
    line: u64,
) -> std::result::Result<LineupRecord, RowError> {
    let cell = |idx: usize| row.get(idx).unwrap_or("");
    let reject = |idx: usize, column: &str| RowError {
        path: source.path.to_path_buf(),
        line,
        column: column.to_string(),
        value: cell(idx).to_string(),
    };
    let number = |idx: usize, column: &str| {
        cell(idx)
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| reject(idx, column))
    };
    let optional = |idx: Option<usize>, column: &str| match idx {
        Some(idx) if !cell(idx).is_empty() => number(idx, column).map(Some),
        _ => Ok(None),
    };

    let minutes = number(columns.minutes, "minutes")?;
    if minutes < 0.0 {
        return Err(reject(columns.minutes, "minutes"));
    }
    let plus_minus = number(columns.plus_minus, "plus-minus")?;
    let net_rating = number(columns.net_rating, "net rating")?;

    let ids: Vec<&str> = columns.players.iter().map(|&idx| cell(idx)).collect();

    Ok(LineupRecord {
        team: source.team.to_string(),
        lineup: roster.lineup(&ids),
        interval: source.interval,
        interval_label: source.label.to_string(),
        minutes,
        net_rating,
        plus_minus,
        plusminus_per40: if minutes > 0.0 {
            plus_minus / minutes * 40.0
        } else {
            f64::NAN
        },
        possessions: optional(columns.possessions, "possessions")?,
        off_rating: optional(columns.off_rating, "offensive rating")?,
        def_rating: optional(columns.def_rating, "defensive rating")?,
    })
}

fn skip_lines(content: &str, n: usize) -> &str {
    let mut rest = content;
    for _ in 0..n {
        match rest.find('\n') {
            Some(i) => rest = &rest[i + 1..],
            None => return "",
        }
    }
    rest
}
