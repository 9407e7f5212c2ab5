//! Business state read models built from the ledger.

pub mod aggregator;

pub use aggregator::{narrative, BusinessStateAggregator, CONTEXT_UNAVAILABLE};
