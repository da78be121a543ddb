//! Conference roster and lineup labels.
//!
//! Lineup exports only carry numeric player ids. The roster maps them to
//! short tags and heights so a lineup can be written as e.g.
//! `JSMI-BWIL-ADAV-KLEE-MROS`, ordered from shortest to tallest player.

use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize, Serializer};
use tracing::{info, warn};

use crate::error::Result;

/// Tag used for an empty or unreadable player id cell.
pub const UNKNOWN_TAG: &str = "UNK";

/// Players on court together, in canonical order.
///
/// The order is fixed by [`Roster::lineup`], so two records listing the same
/// players compare equal regardless of the column order in the export.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lineup(Vec<String>);

impl Lineup {
    /// Builds a lineup from tags with no height information; tags are sorted.
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        tags.sort();
        Self(tags)
    }

    pub fn players(&self) -> &[String] {
        &self.0
    }

    /// True if any player id could not be read.
    pub fn has_unknown(&self) -> bool {
        self.0.iter().any(|t| t == UNKNOWN_TAG)
    }
}

impl fmt::Display for Lineup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("-"))
    }
}

impl Serialize for Lineup {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub tag: String,
    pub height: Option<f64>,
    pub team: String,
}

#[derive(Deserialize)]
struct RosterRow {
    #[serde(rename = "playerId")]
    player_id: String,
    #[serde(rename = "fullName")]
    full_name: String,
    #[serde(rename = "teamMarket", default)]
    team_market: String,
    #[serde(default)]
    height: String,
}

/// Player id to tag/height lookup.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    players: HashMap<i64, Player>,
}

impl Roster {
    /// Loads the conference player CSV at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let roster = Self::from_reader(std::fs::File::open(path)?)?;
        info!(path = %path.display(), players = roster.len(), "Roster loaded");
        Ok(roster)
    }

    /// Reads roster rows (`playerId, fullName, teamMarket, height`).
    ///
    /// Rows whose id cannot be read are skipped; an unreadable height is kept
    /// as `None`.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut players = HashMap::new();

        for result in rdr.deserialize() {
            let row: RosterRow = result?;
            let Some(id) = parse_player_id(&row.player_id) else {
                warn!(
                    player_id = %row.player_id,
                    name = %row.full_name,
                    "Skipping roster row without a usable id"
                );
                continue;
            };
            players.insert(
                id,
                Player {
                    tag: player_tag(&row.full_name),
                    height: row.height.parse::<f64>().ok().filter(|h| h.is_finite()),
                    team: row.team_market,
                },
            );
        }

        Ok(Self { players })
    }

    pub fn get(&self, id: i64) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Builds a lineup from raw id cells, shortest player first.
    ///
    /// Unknown ids are tagged `P{id}`, unreadable cells `UNK`; both sort
    /// after every player with a known height.
    pub fn lineup<S: AsRef<str>>(&self, id_cells: &[S]) -> Lineup {
        let mut entries: Vec<(Option<f64>, String)> = id_cells
            .iter()
            .map(|cell| match parse_player_id(cell.as_ref()) {
                Some(id) => match self.get(id) {
                    Some(player) => (player.height, player.tag.clone()),
                    None => (None, format!("P{id}")),
                },
                None => (None, UNKNOWN_TAG.to_string()),
            })
            .collect();

        entries.sort_by(|(ha, ta), (hb, tb)| {
            let ha = ha.unwrap_or(f64::INFINITY);
            let hb = hb.unwrap_or(f64::INFINITY);
            ha.total_cmp(&hb).then_with(|| ta.cmp(tb))
        });

        Lineup(entries.into_iter().map(|(_, tag)| tag).collect())
    }
}

/// Short player tag: first initial plus the first three letters of the last
/// name, upper-cased (`Brandi Williams` -> `BWIL`).
pub fn player_tag(full_name: &str) -> String {
    let parts: Vec<&str> = full_name.split_whitespace().collect();
    match parts.as_slice() {
        [first, .., last] => {
            let initial = first.chars().take(1);
            let surname = last.chars().take(3);
            initial.chain(surname).collect::<String>().to_uppercase()
        }
        _ => full_name.trim().chars().take(2).collect::<String>().to_uppercase(),
    }
}

/// Reads a player id cell. Exports sometimes write ids as floats (`123.0`);
/// empty cells and id `0` count as missing.
pub fn parse_player_id(cell: &str) -> Option<i64> {
    let cell = cell.trim();
    let id = match cell.parse::<i64>() {
        Ok(id) => id,
        Err(_) => cell.parse::<f64>().ok().filter(|v| v.is_finite())?.trunc() as i64,
    };
    (id != 0).then_some(id)
}
