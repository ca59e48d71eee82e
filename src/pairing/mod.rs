mod bye;
pub mod swiss;

pub use bye::bye_candidates;
pub use swiss::{find_pairing, generate_next_round, generate_with_budget, DEFAULT_SEARCH_BUDGET};
