//! MarketMind: a conversational business agent for market vendors.
//!
//! Vendors describe sales, supplier payments, loan needs and questions in
//! plain text; the agent turns each message into at most one on-chain
//! action against the vendor's contracts and answers in plain text.

pub mod actions;
pub mod agent;
pub mod config;
pub mod heartbeat;
pub mod identity;
pub mod intent;
pub mod ledger;
pub mod registry;
pub mod state;
pub mod types;
