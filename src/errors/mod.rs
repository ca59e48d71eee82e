use thiserror::Error;

use crate::domain::{PlayerId, RuleSetId, TournamentId};

/// Recoverable conditions raised by the tournament engine.
///
/// None of these are fatal: the caller gets the error back and must resubmit
/// the operation with corrected input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Invalid score ruleset: {0}")]
    InvalidRuleSet(String),

    #[error("Pairing infeasible: need at least 2 active players, have {active}")]
    PairingInfeasible { active: usize },

    #[error("Round {round} is incomplete: tables {missing:?} have no reported result")]
    IncompleteRound { round: u32, missing: Vec<u32> },

    #[error("Match at round {round}, table {table} already has a result")]
    MatchAlreadyReported { round: u32, table: u32 },

    #[error("Cannot {operation} while tournament is {state}")]
    InvalidTransition { operation: String, state: String },

    #[error("Ruleset {0} is referenced by a tournament that has already started")]
    RuleSetInUse(RuleSetId),

    #[error("Data integrity violation: {0}")]
    DataIntegrityViolation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Registration for tournament {0} is closed")]
    RegistrationClosed(TournamentId),

    #[error("Tournament {tournament_id} is full ({capacity} seats)")]
    TournamentFull {
        tournament_id: TournamentId,
        capacity: u32,
    },

    #[error("Player {0} is already registered")]
    AlreadyRegistered(PlayerId),

    #[error("Invalid result: {0}")]
    InvalidResult(String),

    #[error("Invalid tournament details: {0}")]
    InvalidDetails(String),
}

impl EngineError {
    pub fn invalid_transition(operation: &str, state: impl std::fmt::Display) -> Self {
        EngineError::InvalidTransition {
            operation: operation.to_string(),
            state: state.to_string(),
        }
    }

    /// Whether the error reflects a conflict with the current tournament state
    /// rather than malformed input.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            EngineError::IncompleteRound { .. }
                | EngineError::MatchAlreadyReported { .. }
                | EngineError::InvalidTransition { .. }
                | EngineError::RuleSetInUse(_)
                | EngineError::RegistrationClosed(_)
                | EngineError::TournamentFull { .. }
                | EngineError::AlreadyRegistered(_)
        )
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Add context to storage load errors
pub fn load_context(entity: &str, id: i64) -> String {
    format!("Failed to load {} {}", entity, id)
}

/// Add context to storage save errors
pub fn save_context(entity: &str, id: i64) -> String {
    format!("Failed to save {} {}", entity, id)
}
