use chrono::{DateTime, Utc};
use log::info;

use super::state::{Effect, LifecycleEvent, LifecycleState, Transition};
use crate::config::EngineSettings;
use crate::domain::{
    Match, MatchResult, PairingHistory, PlayerId, RuleSetId, Round, ScoreRuleSet, Tournament,
    TournamentDetails, TournamentId, TournamentStatus,
};
use crate::errors::{EngineError, EngineResult};
use crate::pairing::generate_with_budget;
use crate::ranking::TournamentResult;
use crate::standings::{compute_standings, Standing};

/// Everything a round transition may need besides the tournament itself
#[derive(Debug, Clone, Copy)]
pub struct RoundContext<'a> {
    pub ruleset: &'a ScoreRuleSet,
    pub settings: &'a EngineSettings,
    pub now: DateTime<Utc>,
}

/// Outcome of [`Tournament::advance_round`]
#[derive(Debug, Clone, PartialEq)]
pub enum RoundAdvance {
    Next { round: u32 },
    Finished { standings: Vec<Standing> },
}

impl Tournament {
    /// Validates the details and opens a tournament for registration.
    pub fn create(
        id: TournamentId,
        details: TournamentDetails,
        ruleset_id: RuleSetId,
    ) -> EngineResult<Self> {
        validate_details(&details)?;
        Ok(Self::new(id, details, ruleset_id))
    }

    pub fn register(&mut self, player_id: PlayerId) -> EngineResult<()> {
        if self.state != LifecycleState::Open {
            return Err(EngineError::RegistrationClosed(self.id));
        }
        if self.players.contains(&player_id) {
            return Err(EngineError::AlreadyRegistered(player_id));
        }
        if self.players.len() >= self.details.capacity as usize {
            return Err(EngineError::TournamentFull {
                tournament_id: self.id,
                capacity: self.details.capacity,
            });
        }

        self.players.push(player_id);
        Ok(())
    }

    pub fn unregister(&mut self, player_id: PlayerId) -> EngineResult<()> {
        if self.state != LifecycleState::Open {
            return Err(EngineError::RegistrationClosed(self.id));
        }
        let idx = self
            .players
            .iter()
            .position(|&p| p == player_id)
            .ok_or_else(|| {
                EngineError::NotFound(format!("player {} in tournament {}", player_id, self.id))
            })?;

        self.players.remove(idx);
        Ok(())
    }

    /// Freezes the roster and pairs round 1.
    pub fn start(&mut self, ctx: &RoundContext<'_>) -> EngineResult<&Round> {
        self.ensure_ruleset(ctx.ruleset)?;
        let transition = self.transition(LifecycleEvent::Start)?;
        if self.players.len() < 2 {
            return Err(EngineError::PairingInfeasible {
                active: self.players.len(),
            });
        }

        self.execute(transition, ctx)?;
        info!(
            "Tournament {} started with {} players",
            self.id,
            self.players.len()
        );
        self.latest_round_or_defect()
    }

    pub fn record_result(
        &mut self,
        round_number: u32,
        table: u32,
        result: MatchResult,
        now: DateTime<Utc>,
    ) -> EngineResult<&Match> {
        self.write_result(round_number, table, result, now, false)
    }

    /// Overwrites a result while its round is still open.
    pub fn correct_result(
        &mut self,
        round_number: u32,
        table: u32,
        result: MatchResult,
        now: DateTime<Utc>,
    ) -> EngineResult<&Match> {
        self.write_result(round_number, table, result, now, true)
    }

    /// Finalizes the current round and returns the standings after it.
    pub fn close_round(&mut self, ctx: &RoundContext<'_>) -> EngineResult<Vec<Standing>> {
        self.ensure_ruleset(ctx.ruleset)?;
        let transition = self.transition(LifecycleEvent::CloseRound)?;
        let number = self.current_round();
        let round = self.current_round_mut()?;

        let missing = round.unreported_tables();
        if !missing.is_empty() {
            return Err(EngineError::IncompleteRound {
                round: number,
                missing,
            });
        }
        round.finalized = true;

        match self.execute(transition, ctx) {
            Ok(standings) => {
                info!("Tournament {} closed round {}", self.id, number);
                Ok(standings.unwrap_or_default())
            }
            Err(e) => {
                self.current_round_mut()?.finalized = false;
                Err(e)
            }
        }
    }

    /// Pairs the next round, or finishes the tournament after the last one.
    pub fn advance_round(&mut self, ctx: &RoundContext<'_>) -> EngineResult<RoundAdvance> {
        self.ensure_ruleset(ctx.ruleset)?;
        let transition = self.transition(LifecycleEvent::AdvanceRound)?;
        let standings = self.execute(transition, ctx)?;

        match (self.state, standings) {
            (LifecycleState::Finished { rounds_played }, Some(standings)) => {
                info!(
                    "Tournament {} finished after {} rounds",
                    self.id, rounds_played
                );
                Ok(RoundAdvance::Finished { standings })
            }
            (state, _) => Ok(RoundAdvance::Next {
                round: state.current_round(),
            }),
        }
    }

    pub fn cancel(&mut self) -> EngineResult<()> {
        let transition = self.transition(LifecycleEvent::Cancel)?;
        self.state = transition.next;
        info!(
            "Tournament {} cancelled at round {}",
            self.id,
            self.current_round()
        );
        Ok(())
    }

    /// Standings over every finalized round so far.
    pub fn standings(&self, ruleset: &ScoreRuleSet) -> EngineResult<Vec<Standing>> {
        self.ensure_ruleset(ruleset)?;
        compute_standings(self.finalized_matches(), ruleset, &self.players)
    }

    pub fn pairing_history(&self) -> PairingHistory {
        PairingHistory::from_rounds(&self.rounds)
    }

    /// Standings packaged for the ranking aggregator.
    pub fn result(&self, ruleset: &ScoreRuleSet) -> EngineResult<TournamentResult> {
        Ok(TournamentResult {
            tournament_id: self.id,
            store_id: self.details.store_id,
            starts_at: self.details.starts_at,
            status: self.status(),
            standings: self.standings(ruleset)?,
        })
    }

    fn transition(&self, event: LifecycleEvent) -> EngineResult<Transition> {
        self.state.apply(event, self.details.total_rounds)
    }

    fn execute(
        &mut self,
        transition: Transition,
        ctx: &RoundContext<'_>,
    ) -> EngineResult<Option<Vec<Standing>>> {
        let mut emitted = None;
        for effect in &transition.effects {
            match *effect {
                Effect::PairRound(number) => self.pair_round(number, ctx)?,
                Effect::ComputeStandings | Effect::EmitFinalStandings => {
                    emitted = Some(self.standings(ctx.ruleset)?);
                }
            }
        }

        self.state = transition.next;
        Ok(emitted)
    }

    fn pair_round(&mut self, number: u32, ctx: &RoundContext<'_>) -> EngineResult<()> {
        let standings = self.standings(ctx.ruleset)?;
        let history = self.pairing_history();
        let matches = generate_with_budget(
            &standings,
            &history,
            number,
            ctx.settings.pairing_search_budget,
        )?;

        self.rounds.push(Round::new(number, matches, ctx.now));
        Ok(())
    }

    fn write_result(
        &mut self,
        round_number: u32,
        table: u32,
        result: MatchResult,
        now: DateTime<Utc>,
        correction: bool,
    ) -> EngineResult<&Match> {
        let operation = if correction {
            "correct a result"
        } else {
            "record a result"
        };
        if self.status() != TournamentStatus::InProgress {
            return Err(EngineError::invalid_transition(operation, self.state));
        }

        let round = self
            .round(round_number)
            .ok_or_else(|| self.missing(&format!("round {}", round_number)))?;
        if round.finalized {
            return Err(EngineError::MatchAlreadyReported {
                round: round_number,
                table,
            });
        }
        self.transition(LifecycleEvent::RecordResult)?;

        let missing = self.missing(&format!("table {} of round {}", table, round_number));
        let m = self
            .rounds
            .iter_mut()
            .find(|r| r.number == round_number)
            .and_then(|r| r.match_at_mut(table))
            .ok_or(missing)?;

        validate_result(m, result)?;
        if m.is_reported() && !correction {
            return Err(EngineError::MatchAlreadyReported {
                round: round_number,
                table,
            });
        }

        m.result = Some(result);
        m.reported_at = Some(now);
        Ok(&*m)
    }

    fn ensure_ruleset(&self, ruleset: &ScoreRuleSet) -> EngineResult<()> {
        if ruleset.id() != self.ruleset_id {
            return Err(EngineError::DataIntegrityViolation(format!(
                "tournament {} is scored with ruleset {}, got ruleset {}",
                self.id,
                self.ruleset_id,
                ruleset.id()
            )));
        }
        Ok(())
    }

    fn current_round_mut(&mut self) -> EngineResult<&mut Round> {
        let number = self.current_round();
        let id = self.id;
        self.rounds
            .iter_mut()
            .find(|r| r.number == number)
            .ok_or_else(|| {
                EngineError::DataIntegrityViolation(format!(
                    "tournament {} has no round {}",
                    id, number
                ))
            })
    }

    fn latest_round_or_defect(&self) -> EngineResult<&Round> {
        self.latest_round().ok_or_else(|| {
            EngineError::DataIntegrityViolation(format!("tournament {} has no rounds", self.id))
        })
    }

    fn missing(&self, what: &str) -> EngineError {
        EngineError::NotFound(format!("{} in tournament {}", what, self.id))
    }
}

fn validate_details(details: &TournamentDetails) -> EngineResult<()> {
    if details.name.trim().is_empty() {
        return Err(EngineError::InvalidDetails("name must not be empty".into()));
    }
    if details.total_rounds == 0 {
        return Err(EngineError::InvalidDetails(
            "at least one round is required".into(),
        ));
    }
    if details.capacity < 2 {
        return Err(EngineError::InvalidDetails(
            "capacity must allow at least two players".into(),
        ));
    }
    if !details.entry_fee.is_finite() || details.entry_fee < 0.0 {
        return Err(EngineError::InvalidDetails(format!(
            "invalid entry fee {}",
            details.entry_fee
        )));
    }
    Ok(())
}

fn validate_result(m: &Match, result: MatchResult) -> EngineResult<()> {
    if m.is_bye() {
        return Err(EngineError::InvalidResult(format!(
            "table {} is a bye for player {}",
            m.table, m.player1
        )));
    }
    if let MatchResult::Winner(winner) = result {
        if !m.involves(winner) {
            return Err(EngineError::InvalidResult(format!(
                "player {} does not play at table {}",
                winner, m.table
            )));
        }
    }
    Ok(())
}
