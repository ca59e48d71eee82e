use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::PlayerId;

/// A player's position in one tournament snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub rank: u32,
    pub player_id: PlayerId,
    pub points: f64,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub byes: u32,
    pub opponents: BTreeSet<PlayerId>,
    /// Strength of schedule: mean win rate of the opponents faced
    pub opponent_win_rate: f64,
}

impl Standing {
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            rank: 0,
            player_id,
            points: 0.0,
            wins: 0,
            losses: 0,
            draws: 0,
            byes: 0,
            opponents: BTreeSet::new(),
            opponent_win_rate: 0.0,
        }
    }

    pub fn matches_played(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    pub fn win_rate(&self) -> f64 {
        win_rate(self.wins, self.losses, self.draws)
    }

    pub fn rank_key(&self) -> RankKey {
        RankKey {
            points: self.points,
            tiebreak: self.opponent_win_rate,
            player_id: self.player_id,
        }
    }
}

/// Wins over all decided matches, 0 when nothing was played
pub fn win_rate(wins: u32, losses: u32, draws: u32) -> f64 {
    let played = wins + losses + draws;
    if played == 0 {
        0.0
    } else {
        wins as f64 / played as f64
    }
}

/// Sort key shared by tournament standings and cross-tournament rankings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankKey {
    pub points: f64,
    pub tiebreak: f64,
    pub player_id: PlayerId,
}

impl RankKey {
    /// Points descending, tiebreak descending, player id ascending.
    ///
    /// Player ids are unique within a cohort, so this is a total order.
    pub fn compare(&self, other: &RankKey) -> Ordering {
        other
            .points
            .total_cmp(&self.points)
            .then_with(|| other.tiebreak.total_cmp(&self.tiebreak))
            .then_with(|| self.player_id.cmp(&other.player_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(points: f64, tiebreak: f64, player_id: PlayerId) -> RankKey {
        RankKey {
            points,
            tiebreak,
            player_id,
        }
    }

    #[test]
    fn test_rank_key_ordering() {
        let mut keys = vec![
            key(3.0, 0.5, 4),
            key(6.0, 0.0, 9),
            key(3.0, 0.5, 2),
            key(3.0, 0.75, 8),
        ];
        keys.sort_by(|a, b| a.compare(b));

        let ids: Vec<PlayerId> = keys.iter().map(|k| k.player_id).collect();
        assert_eq!(ids, vec![9, 8, 2, 4]);
    }

    #[test]
    fn test_win_rate_without_matches_is_zero() {
        assert_eq!(win_rate(0, 0, 0), 0.0);
        assert_eq!(win_rate(1, 2, 1), 0.25);
    }
}
