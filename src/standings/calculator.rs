use std::collections::BTreeMap;

use log::debug;

use super::types::Standing;
use crate::domain::{Match, MatchResult, Outcome, PlayerId, ScoreRuleSet};
use crate::errors::{EngineError, EngineResult};

type StandingMap = BTreeMap<PlayerId, Standing>;

/// Computes ranked standings from scratch.
///
/// Every registered player gets a row, even without matches. Matches without a
/// result are skipped; byes count as a win with no opponent. Any match that
/// references an unregistered player is reported as a data integrity violation.
pub fn compute_standings<'a, I>(
    matches: I,
    ruleset: &ScoreRuleSet,
    players: &[PlayerId],
) -> EngineResult<Vec<Standing>>
where
    I: IntoIterator<Item = &'a Match>,
{
    let mut table = initialize_table(players)?;

    for m in matches {
        apply_match(&mut table, m, ruleset)?;
    }

    assign_opponent_win_rates(&mut table);
    let standings = rank(table);
    debug!("Computed standings for {} players", standings.len());
    Ok(standings)
}

fn initialize_table(players: &[PlayerId]) -> EngineResult<StandingMap> {
    let mut table = StandingMap::new();
    for &player_id in players {
        if table.insert(player_id, Standing::new(player_id)).is_some() {
            return Err(EngineError::DataIntegrityViolation(format!(
                "player {} is registered twice",
                player_id
            )));
        }
    }
    Ok(table)
}

fn apply_match(table: &mut StandingMap, m: &Match, ruleset: &ScoreRuleSet) -> EngineResult<()> {
    match (m.player2, m.result) {
        (None, _) => apply_bye(table, m, ruleset),
        (Some(_), None) => Ok(()),
        (Some(opponent), Some(result)) => apply_result(table, m, opponent, result, ruleset),
    }
}

fn apply_bye(table: &mut StandingMap, m: &Match, ruleset: &ScoreRuleSet) -> EngineResult<()> {
    let (points, _) = ruleset.score_for(Outcome::Win);
    let standing = entry(table, m, m.player1)?;
    standing.points += points;
    standing.wins += 1;
    standing.byes += 1;
    Ok(())
}

fn apply_result(
    table: &mut StandingMap,
    m: &Match,
    opponent: PlayerId,
    result: MatchResult,
    ruleset: &ScoreRuleSet,
) -> EngineResult<()> {
    if m.player1 == opponent {
        return Err(integrity(m, "pairs a player against themselves"));
    }
    if let MatchResult::Winner(winner) = result {
        if !m.involves(winner) {
            return Err(integrity(m, &format!("names non-participant {} as winner", winner)));
        }
    }

    let first_outcome = result.outcome_for(m.player1);
    let second_outcome = result.outcome_for(opponent);
    let (first_points, to_second) = ruleset.score_for(first_outcome);
    let (second_points, to_first) = ruleset.score_for(second_outcome);

    // Validate both sides before touching either.
    entry(table, m, opponent)?;
    record(entry(table, m, m.player1)?, opponent, first_outcome, first_points + to_first);
    record(entry(table, m, opponent)?, m.player1, second_outcome, second_points + to_second);
    Ok(())
}

fn record(standing: &mut Standing, opponent: PlayerId, outcome: Outcome, points: f64) {
    standing.points += points;
    standing.opponents.insert(opponent);
    match outcome {
        Outcome::Win => standing.wins += 1,
        Outcome::Loss => standing.losses += 1,
        Outcome::Draw => standing.draws += 1,
    }
}

fn entry<'t>(table: &'t mut StandingMap, m: &Match, player_id: PlayerId) -> EngineResult<&'t mut Standing> {
    table
        .get_mut(&player_id)
        .ok_or_else(|| integrity(m, &format!("references unregistered player {}", player_id)))
}

fn integrity(m: &Match, problem: &str) -> EngineError {
    EngineError::DataIntegrityViolation(format!(
        "match at round {}, table {} {}",
        m.round_number, m.table, problem
    ))
}

fn assign_opponent_win_rates(table: &mut StandingMap) {
    let win_rates: BTreeMap<PlayerId, f64> = table
        .iter()
        .map(|(&id, standing)| (id, standing.win_rate()))
        .collect();

    for standing in table.values_mut() {
        standing.opponent_win_rate = mean_win_rate(standing, &win_rates);
    }
}

fn mean_win_rate(standing: &Standing, win_rates: &BTreeMap<PlayerId, f64>) -> f64 {
    if standing.opponents.is_empty() {
        return 0.0;
    }
    let total: f64 = standing
        .opponents
        .iter()
        .map(|id| win_rates.get(id).copied().unwrap_or(0.0))
        .sum();
    total / standing.opponents.len() as f64
}

fn rank(table: StandingMap) -> Vec<Standing> {
    let mut standings: Vec<Standing> = table.into_values().collect();
    standings.sort_by(|a, b| a.rank_key().compare(&b.rank_key()));
    for (idx, standing) in standings.iter_mut().enumerate() {
        standing.rank = idx as u32 + 1;
    }
    standings
}
