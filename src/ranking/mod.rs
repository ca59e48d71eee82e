pub mod aggregator;
pub mod cache;
pub mod types;

pub use aggregator::rebuild_rankings;
pub use cache::RankingCache;
pub use types::{RankingEntry, RankingScope, RankingWindow, TournamentResult};
