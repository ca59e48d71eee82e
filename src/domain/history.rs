use std::collections::BTreeSet;

use super::models::{PlayerId, Round};

/// Unordered set of player pairs that have already met.
///
/// Pairs are stored as `(min, max)` so the direction of a match never matters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairingHistory {
    pairs: BTreeSet<(PlayerId, PlayerId)>,
}

impl PairingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rounds<'a>(rounds: impl IntoIterator<Item = &'a Round>) -> Self {
        let mut history = Self::new();
        for round in rounds {
            for m in &round.matches {
                if let Some(opponent) = m.player2 {
                    history.insert(m.player1, opponent);
                }
            }
        }
        history
    }

    pub fn insert(&mut self, a: PlayerId, b: PlayerId) -> bool {
        self.pairs.insert(canonical(a, b))
    }

    pub fn contains(&self, a: PlayerId, b: PlayerId) -> bool {
        self.pairs.contains(&canonical(a, b))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(PlayerId, PlayerId)> {
        self.pairs.iter()
    }
}

fn canonical(a: PlayerId, b: PlayerId) -> (PlayerId, PlayerId) {
    (a.min(b), a.max(b))
}
