pub mod daemon;
pub mod rules;

pub use daemon::{DecisionLoop, TickOutcome};
