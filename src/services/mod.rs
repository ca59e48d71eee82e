pub mod rankings;
pub mod server;
pub mod tournaments;

pub use rankings::RankingService;
pub use server::ServerService;
pub use tournaments::TournamentService;
