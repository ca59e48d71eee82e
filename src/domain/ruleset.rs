use serde::{Deserialize, Serialize};

use super::models::{Outcome, RuleSetId};
use crate::errors::{EngineError, EngineResult};

/// Point values of a scoring ruleset.
///
/// `win`/`loss`/`draw` go to the player with that outcome; the `opponent_on_*`
/// values are added to that player's opponent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointTable {
    pub win: f64,
    pub loss: f64,
    pub draw: f64,
    pub opponent_on_win: f64,
    pub opponent_on_loss: f64,
    pub opponent_on_draw: f64,
}

impl PointTable {
    /// 3/0/1, the usual card game table.
    pub fn standard() -> Self {
        Self {
            win: 3.0,
            loss: 0.0,
            draw: 1.0,
            opponent_on_win: 0.0,
            opponent_on_loss: 0.0,
            opponent_on_draw: 0.0,
        }
    }

    fn fields(&self) -> [(&'static str, f64); 6] {
        [
            ("win", self.win),
            ("loss", self.loss),
            ("draw", self.draw),
            ("opponent_on_win", self.opponent_on_win),
            ("opponent_on_loss", self.opponent_on_loss),
            ("opponent_on_draw", self.opponent_on_draw),
        ]
    }

    fn validate(&self) -> EngineResult<()> {
        for (name, value) in self.fields() {
            if !value.is_finite() {
                return Err(EngineError::InvalidRuleSet(format!(
                    "{} must be a finite number, got {}",
                    name, value
                )));
            }
            if value < 0.0 {
                return Err(EngineError::InvalidRuleSet(format!(
                    "{} must not be negative, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Named, versioned scoring configuration shared by many tournaments.
///
/// Only constructible through [`ScoreRuleSet::new`], so every instance in the
/// engine has passed validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRuleSet {
    id: RuleSetId,
    tcg_id: i64,
    name: String,
    version: u32,
    points: PointTable,
}

impl ScoreRuleSet {
    pub fn new(
        id: RuleSetId,
        tcg_id: i64,
        name: impl Into<String>,
        version: u32,
        points: PointTable,
    ) -> EngineResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(EngineError::InvalidRuleSet("name must not be empty".into()));
        }
        points.validate()?;

        Ok(Self {
            id,
            tcg_id,
            name,
            version,
            points,
        })
    }

    pub fn id(&self) -> RuleSetId {
        self.id
    }

    pub fn tcg_id(&self) -> i64 {
        self.tcg_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn points(&self) -> &PointTable {
        &self.points
    }

    /// Returns `(points for the player, points added to the opponent)`.
    pub fn score_for(&self, outcome: Outcome) -> (f64, f64) {
        let p = &self.points;
        match outcome {
            Outcome::Win => (p.win, p.opponent_on_win),
            Outcome::Loss => (p.loss, p.opponent_on_loss),
            Outcome::Draw => (p.draw, p.opponent_on_draw),
        }
    }

    /// Copy of this ruleset under a new id and the next version number.
    pub fn next_version(&self, id: RuleSetId, points: PointTable) -> EngineResult<Self> {
        Self::new(id, self.tcg_id, self.name.clone(), self.version + 1, points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_for_each_outcome() {
        let points = PointTable {
            opponent_on_draw: 0.5,
            ..PointTable::standard()
        };
        let ruleset = ScoreRuleSet::new(1, 7, "Standard", 1, points).unwrap();

        assert_eq!(ruleset.score_for(Outcome::Win), (3.0, 0.0));
        assert_eq!(ruleset.score_for(Outcome::Loss), (0.0, 0.0));
        assert_eq!(ruleset.score_for(Outcome::Draw), (1.0, 0.5));
    }

    #[test]
    fn test_rejects_negative_values() {
        let points = PointTable {
            loss: -1.0,
            ..PointTable::standard()
        };
        let err = ScoreRuleSet::new(1, 7, "Broken", 1, points).unwrap_err();
        assert!(matches!(err, EngineError::InvalidRuleSet(msg) if msg.contains("loss")));
    }

    #[test]
    fn test_rejects_non_finite_values() {
        for bad in [f64::NAN, f64::INFINITY] {
            let points = PointTable {
                opponent_on_win: bad,
                ..PointTable::standard()
            };
            assert!(ScoreRuleSet::new(1, 7, "Broken", 1, points).is_err());
        }
    }

    #[test]
    fn test_rejects_blank_name() {
        assert!(ScoreRuleSet::new(1, 7, "  ", 1, PointTable::standard()).is_err());
    }

    #[test]
    fn test_next_version_keeps_identity_fields() {
        let ruleset = ScoreRuleSet::new(1, 7, "Standard", 1, PointTable::standard()).unwrap();
        let revised = ruleset
            .next_version(
                2,
                PointTable {
                    draw: 0.5,
                    ..PointTable::standard()
                },
            )
            .unwrap();

        assert_eq!(revised.id(), 2);
        assert_eq!(revised.tcg_id(), 7);
        assert_eq!(revised.name(), "Standard");
        assert_eq!(revised.version(), 2);
        assert_eq!(ruleset.points().draw, 1.0);
    }
}
