use serde::{Deserialize, Serialize};

use crate::domain::TournamentStatus;
use crate::errors::{EngineError, EngineResult};

/// Tournament lifecycle as a tagged variant.
///
/// `Finished` and `Cancelled` are terminal; every transition out of them is
/// rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LifecycleState {
    Open,
    InProgress { round: u32, round_closed: bool },
    Finished { rounds_played: u32 },
    Cancelled { rounds_played: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Start,
    RecordResult,
    CloseRound,
    AdvanceRound,
    Cancel,
}

impl LifecycleEvent {
    fn describe(&self) -> &'static str {
        match self {
            LifecycleEvent::Start => "start the tournament",
            LifecycleEvent::RecordResult => "record a result",
            LifecycleEvent::CloseRound => "close the round",
            LifecycleEvent::AdvanceRound => "advance to the next round",
            LifecycleEvent::Cancel => "cancel the tournament",
        }
    }
}

/// Work the controller must carry out for a transition to take effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    PairRound(u32),
    ComputeStandings,
    EmitFinalStandings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: LifecycleState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(next: LifecycleState, effects: Vec<Effect>) -> Self {
        Self { next, effects }
    }
}

impl LifecycleState {
    /// Computes the transition for `event` without changing `self`.
    pub fn apply(&self, event: LifecycleEvent, total_rounds: u32) -> EngineResult<Transition> {
        use LifecycleEvent as E;
        use LifecycleState as S;

        match (*self, event) {
            (S::Open, E::Start) => Ok(Transition::to(
                S::InProgress {
                    round: 1,
                    round_closed: false,
                },
                vec![Effect::PairRound(1)],
            )),
            (
                S::InProgress {
                    round_closed: false,
                    ..
                },
                E::RecordResult,
            ) => Ok(Transition::to(*self, Vec::new())),
            (
                S::InProgress {
                    round,
                    round_closed: false,
                },
                E::CloseRound,
            ) => Ok(Transition::to(
                S::InProgress {
                    round,
                    round_closed: true,
                },
                vec![Effect::ComputeStandings],
            )),
            (
                S::InProgress {
                    round,
                    round_closed: true,
                },
                E::AdvanceRound,
            ) => {
                if round >= total_rounds {
                    Ok(Transition::to(
                        S::Finished {
                            rounds_played: round,
                        },
                        vec![Effect::EmitFinalStandings],
                    ))
                } else {
                    Ok(Transition::to(
                        S::InProgress {
                            round: round + 1,
                            round_closed: false,
                        },
                        vec![Effect::PairRound(round + 1)],
                    ))
                }
            }
            (S::Open, E::Cancel) | (S::InProgress { .. }, E::Cancel) => Ok(Transition::to(
                S::Cancelled {
                    rounds_played: self.current_round(),
                },
                Vec::new(),
            )),
            (state, event) => Err(EngineError::invalid_transition(event.describe(), state)),
        }
    }

    pub fn status(&self) -> TournamentStatus {
        match self {
            LifecycleState::Open => TournamentStatus::Open,
            LifecycleState::InProgress { .. } => TournamentStatus::InProgress,
            LifecycleState::Finished { .. } => TournamentStatus::Finished,
            LifecycleState::Cancelled { .. } => TournamentStatus::Cancelled,
        }
    }

    /// Round index, 0 before the first round is paired
    pub fn current_round(&self) -> u32 {
        match *self {
            LifecycleState::Open => 0,
            LifecycleState::InProgress { round, .. } => round,
            LifecycleState::Finished { rounds_played } => rounds_played,
            LifecycleState::Cancelled { rounds_played } => rounds_played,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LifecycleState::Finished { .. } | LifecycleState::Cancelled { .. }
        )
    }

    /// Rebuilds the state from its persisted columns.
    pub fn restore(status: TournamentStatus, current_round: u32, round_closed: bool) -> Self {
        match status {
            TournamentStatus::Open => LifecycleState::Open,
            TournamentStatus::InProgress => LifecycleState::InProgress {
                round: current_round,
                round_closed,
            },
            TournamentStatus::Finished => LifecycleState::Finished {
                rounds_played: current_round,
            },
            TournamentStatus::Cancelled => LifecycleState::Cancelled {
                rounds_played: current_round,
            },
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::InProgress {
                round,
                round_closed: true,
            } => write!(f, "in_progress (round {} closed)", round),
            LifecycleState::InProgress { round, .. } => write!(f, "in_progress (round {})", round),
            other => f.write_str(other.status().as_str()),
        }
    }
}
