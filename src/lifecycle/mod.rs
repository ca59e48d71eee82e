pub mod controller;
pub mod state;

pub use controller::{RoundAdvance, RoundContext};
pub use state::{Effect, LifecycleEvent, LifecycleState, Transition};
