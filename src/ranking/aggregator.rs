use std::collections::{BTreeMap, BTreeSet};

use log::info;

use super::types::{RankingEntry, RankingScope, RankingWindow, TournamentResult};
use crate::domain::{PlayerId, TournamentStatus};
use crate::errors::{EngineError, EngineResult};
use crate::standings::{win_rate, RankKey};

#[derive(Debug, Default)]
struct Totals {
    points: f64,
    tournaments_played: u32,
    wins: u32,
    losses: u32,
    draws: u32,
}

/// Rebuilds a ranking table from scratch.
///
/// Only finished tournaments inside `window` whose store is covered by
/// `scope` contribute; cancelled and unfinished ones are skipped. An empty
/// window yields an empty table.
pub fn rebuild_rankings(
    scope: RankingScope,
    window: RankingWindow,
    tournaments: &[TournamentResult],
) -> EngineResult<Vec<RankingEntry>> {
    let mut totals: BTreeMap<PlayerId, Totals> = BTreeMap::new();
    let mut counted = 0;

    for tournament in tournaments.iter().filter(|t| qualifies(t, scope, window)) {
        fold_tournament(&mut totals, tournament)?;
        counted += 1;
    }

    let entries = rank_entries(totals, scope, window);
    info!(
        "Rebuilt {} ranking for {}: {} tournaments, {} players",
        window,
        scope,
        counted,
        entries.len()
    );
    Ok(entries)
}

fn qualifies(tournament: &TournamentResult, scope: RankingScope, window: RankingWindow) -> bool {
    tournament.status == TournamentStatus::Finished
        && scope.covers(tournament.store_id)
        && window.contains(tournament.starts_at)
}

fn fold_tournament(
    totals: &mut BTreeMap<PlayerId, Totals>,
    tournament: &TournamentResult,
) -> EngineResult<()> {
    let mut seen = BTreeSet::new();

    for standing in &tournament.standings {
        if !seen.insert(standing.player_id) {
            return Err(EngineError::DataIntegrityViolation(format!(
                "player {} appears twice in final standings of tournament {}",
                standing.player_id, tournament.tournament_id
            )));
        }

        let row = totals.entry(standing.player_id).or_default();
        row.points += standing.points;
        row.tournaments_played += 1;
        row.wins += standing.wins;
        row.losses += standing.losses;
        row.draws += standing.draws;
    }
    Ok(())
}

fn rank_entries(
    totals: BTreeMap<PlayerId, Totals>,
    scope: RankingScope,
    window: RankingWindow,
) -> Vec<RankingEntry> {
    let mut entries: Vec<RankingEntry> = totals
        .into_iter()
        .map(|(player_id, t)| RankingEntry {
            rank: 0,
            player_id,
            scope,
            window,
            points: t.points,
            tournaments_played: t.tournaments_played,
            wins: t.wins,
            losses: t.losses,
            draws: t.draws,
            win_rate: win_rate(t.wins, t.losses, t.draws),
        })
        .collect();

    entries.sort_by(|a, b| rank_key(a).compare(&rank_key(b)));
    for (idx, entry) in entries.iter_mut().enumerate() {
        entry.rank = idx as u32 + 1;
    }
    entries
}

fn rank_key(entry: &RankingEntry) -> RankKey {
    RankKey {
        points: entry.points,
        tiebreak: entry.win_rate,
        player_id: entry.player_id,
    }
}
