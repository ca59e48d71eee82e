mod history;
pub mod models;
pub mod ruleset;

pub use history::PairingHistory;
pub use models::*;
pub use ruleset::{PointTable, ScoreRuleSet};
