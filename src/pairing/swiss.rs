use log::{debug, info, warn};

use super::bye::bye_candidates;
use crate::domain::{Match, PairingHistory, PlayerId};
use crate::errors::{EngineError, EngineResult};
use crate::standings::Standing;

/// Upper bound on candidate pairings tried per search
pub const DEFAULT_SEARCH_BUDGET: usize = 200_000;

/// Pairs the next round with the default search budget.
pub fn generate_next_round(
    standings: &[Standing],
    history: &PairingHistory,
    round_number: u32,
) -> EngineResult<Vec<Match>> {
    generate_with_budget(standings, history, round_number, DEFAULT_SEARCH_BUDGET)
}

/// Swiss pairing in standings order.
///
/// Every player appears exactly once. The highest unpaired player meets the
/// next highest one they have not played yet, which keeps pairings inside a
/// score group and pulls down from the nearest lower group only when needed.
/// The search backtracks, so a rematch-free pairing is found whenever one
/// exists within `budget` steps.
pub fn generate_with_budget(
    standings: &[Standing],
    history: &PairingHistory,
    round_number: u32,
    budget: usize,
) -> EngineResult<Vec<Match>> {
    if standings.len() < 2 {
        return Err(EngineError::PairingInfeasible {
            active: standings.len(),
        });
    }

    let ordered = order_by_rank(standings);
    let (pairs, bye) = if ordered.len() % 2 == 0 {
        let ids: Vec<PlayerId> = ordered.iter().map(|s| s.player_id).collect();
        (pair_or_fallback(&ids, history, budget, round_number), None)
    } else {
        pair_with_bye(&ordered, history, budget, round_number)
    };

    let matches = build_matches(round_number, &pairs, bye);
    info!(
        "Paired round {}: {} tables, bye: {}",
        round_number,
        matches.len(),
        bye.map_or_else(|| "none".to_string(), |id| id.to_string())
    );
    Ok(matches)
}

fn order_by_rank(standings: &[Standing]) -> Vec<&Standing> {
    let mut ordered: Vec<&Standing> = standings.iter().collect();
    ordered.sort_by(|a, b| a.rank_key().compare(&b.rank_key()));
    ordered
}

fn pair_with_bye(
    ordered: &[&Standing],
    history: &PairingHistory,
    budget: usize,
    round_number: u32,
) -> (Vec<(PlayerId, PlayerId)>, Option<PlayerId>) {
    let candidates = bye_candidates(ordered);

    for &idx in &candidates {
        let field = field_without(ordered, idx);
        if let Some(pairs) = find_pairing(&field, history, budget) {
            return (pairs, Some(ordered[idx].player_id));
        }
        debug!(
            "Bye for player {} leaves no rematch-free pairing",
            ordered[idx].player_id
        );
    }

    // Policy choice stands even when every option forces a rematch.
    let idx = candidates[0];
    let field = field_without(ordered, idx);
    (
        fallback_pairing(&field, round_number),
        Some(ordered[idx].player_id),
    )
}

fn field_without(ordered: &[&Standing], skip: usize) -> Vec<PlayerId> {
    ordered
        .iter()
        .enumerate()
        .filter(|&(idx, _)| idx != skip)
        .map(|(_, s)| s.player_id)
        .collect()
}

fn pair_or_fallback(
    players: &[PlayerId],
    history: &PairingHistory,
    budget: usize,
    round_number: u32,
) -> Vec<(PlayerId, PlayerId)> {
    find_pairing(players, history, budget).unwrap_or_else(|| fallback_pairing(players, round_number))
}

fn fallback_pairing(players: &[PlayerId], round_number: u32) -> Vec<(PlayerId, PlayerId)> {
    warn!(
        "No rematch-free pairing for round {}, pairing in standings order",
        round_number
    );
    players.chunks(2).map(|pair| (pair[0], pair[1])).collect()
}

/// Rematch-free pairing of an even-sized field, if one exists.
pub fn find_pairing(
    players: &[PlayerId],
    history: &PairingHistory,
    budget: usize,
) -> Option<Vec<(PlayerId, PlayerId)>> {
    let mut search = PairingSearch::new(players, history, budget);
    if search.solve() {
        Some(search.pairs)
    } else {
        None
    }
}

struct PairingSearch<'a> {
    players: &'a [PlayerId],
    history: &'a PairingHistory,
    used: Vec<bool>,
    pairs: Vec<(PlayerId, PlayerId)>,
    steps: usize,
    budget: usize,
}

impl<'a> PairingSearch<'a> {
    fn new(players: &'a [PlayerId], history: &'a PairingHistory, budget: usize) -> Self {
        Self {
            players,
            history,
            used: vec![false; players.len()],
            pairs: Vec::with_capacity(players.len() / 2),
            steps: 0,
            budget,
        }
    }

    fn budget_spent(&self) -> bool {
        self.steps >= self.budget
    }

    fn solve(&mut self) -> bool {
        let Some(first) = self.used.iter().position(|used| !used) else {
            return true;
        };
        self.used[first] = true;

        for candidate in first + 1..self.players.len() {
            if self.budget_spent() {
                break;
            }
            if self.used[candidate] || !self.can_meet(first, candidate) {
                continue;
            }

            self.steps += 1;
            self.used[candidate] = true;
            self.pairs.push((self.players[first], self.players[candidate]));

            if self.solve() {
                return true;
            }

            self.pairs.pop();
            self.used[candidate] = false;
        }

        self.used[first] = false;
        false
    }

    fn can_meet(&self, a: usize, b: usize) -> bool {
        !self.history.contains(self.players[a], self.players[b])
    }
}

fn build_matches(
    round_number: u32,
    pairs: &[(PlayerId, PlayerId)],
    bye: Option<PlayerId>,
) -> Vec<Match> {
    let mut matches: Vec<Match> = pairs
        .iter()
        .zip(1u32..)
        .map(|(&(a, b), table)| Match::pairing(round_number, table, a, b))
        .collect();

    if let Some(player) = bye {
        let table = matches.len() as u32 + 1;
        matches.push(Match::bye(round_number, table, player));
    }
    matches
}
