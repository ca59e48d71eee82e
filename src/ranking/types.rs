use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{PlayerId, StoreId, TournamentId, TournamentStatus};
use crate::standings::Standing;

/// Which organizers a ranking covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "store_id", rename_all = "snake_case")]
pub enum RankingScope {
    Global,
    Store(StoreId),
}

impl RankingScope {
    pub fn covers(&self, store_id: StoreId) -> bool {
        match self {
            RankingScope::Global => true,
            RankingScope::Store(id) => *id == store_id,
        }
    }
}

impl fmt::Display for RankingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankingScope::Global => f.write_str("global"),
            RankingScope::Store(id) => write!(f, "store {}", id),
        }
    }
}

/// Calendar period a ranking covers (UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingWindow {
    Month { year: i32, month: u32 },
    Year { year: i32 },
    AllTime,
}

impl RankingWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        match *self {
            RankingWindow::Month { year, month } => at.year() == year && at.month() == month,
            RankingWindow::Year { year } => at.year() == year,
            RankingWindow::AllTime => true,
        }
    }

    /// Month, year and all-time windows around `at`.
    pub fn enclosing(at: DateTime<Utc>) -> [RankingWindow; 3] {
        [
            RankingWindow::Month {
                year: at.year(),
                month: at.month(),
            },
            RankingWindow::Year { year: at.year() },
            RankingWindow::AllTime,
        ]
    }
}

impl fmt::Display for RankingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankingWindow::Month { year, month } => write!(f, "{:04}-{:02}", year, month),
            RankingWindow::Year { year } => write!(f, "{:04}", year),
            RankingWindow::AllTime => f.write_str("all"),
        }
    }
}

impl FromStr for RankingWindow {
    type Err = String;

    /// Accepts `all`, `YYYY` or `YYYY-MM`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("all") {
            return Ok(RankingWindow::AllTime);
        }

        let invalid = || format!("invalid ranking window '{}', expected all, YYYY or YYYY-MM", value);
        match value.split_once('-') {
            None => {
                let year = value.parse().map_err(|_| invalid())?;
                Ok(RankingWindow::Year { year })
            }
            Some((year, month)) => {
                let year = year.parse().map_err(|_| invalid())?;
                let month: u32 = month.parse().map_err(|_| invalid())?;
                if !(1..=12).contains(&month) {
                    return Err(invalid());
                }
                Ok(RankingWindow::Month { year, month })
            }
        }
    }
}

/// Final standings of one tournament, the unit the aggregator folds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentResult {
    pub tournament_id: TournamentId,
    pub store_id: StoreId,
    pub starts_at: DateTime<Utc>,
    pub status: TournamentStatus,
    pub standings: Vec<Standing>,
}

/// One player's row in a ranking table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub rank: u32,
    pub player_id: PlayerId,
    pub scope: RankingScope,
    pub window: RankingWindow,
    pub points: f64,
    pub tournaments_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub win_rate: f64,
}
