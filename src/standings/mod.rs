pub mod calculator;
pub mod types;

pub use calculator::compute_standings;
pub use types::{win_rate, RankKey, Standing};
