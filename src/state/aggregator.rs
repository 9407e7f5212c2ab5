//! Business state aggregation.
//!
//! Builds a [`BusinessSnapshot`] from several independent ledger reads and
//! renders it as a short narrative for the conversation context. A snapshot
//! is either complete or absent; partial figures are never returned.

use crate::actions::units::format_units;
use crate::ledger::{self, GatewayError, Ledger, ReadCall};
use crate::types::BusinessSnapshot;
use chrono::Utc;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, warn};

/// Shown in place of the narrative when any read fails.
pub const CONTEXT_UNAVAILABLE: &str = "Note: Onchain business context currently unavailable.";

/// Items summarised in a snapshot.
pub const TOP_ITEMS: usize = 3;

/// Upper bound of the scoring contract's scale.
pub const SCORE_SCALE: u128 = 850;

pub struct BusinessStateAggregator {
    ledger: Arc<dyn Ledger>,
}

impl BusinessStateAggregator {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    /// Read the current business state. Fails if any constituent read fails.
    pub async fn snapshot(&self) -> Result<BusinessSnapshot, GatewayError> {
        let ledger = self.ledger.as_ref();

        let (credit_score, total_revenue, total_costs, wallet_balance, items) = tokio::try_join!(
            ledger::read_uint(ledger, ReadCall::CreditScore),
            ledger::read_uint(ledger, ReadCall::TotalRevenue),
            ledger::read_uint(ledger, ReadCall::TotalCosts),
            ledger::read_uint(ledger, ReadCall::Balance),
            ledger::read_items(ledger),
        )?;

        let mut top_inventory = Vec::with_capacity(TOP_ITEMS.min(items.len()));
        for item in items.iter().take(TOP_ITEMS) {
            let record = ledger::read_inventory(ledger, item).await?;
            top_inventory.push((item.clone(), record.quantity));
        }

        debug!(
            %credit_score,
            items = items.len(),
            "Business snapshot assembled"
        );

        Ok(BusinessSnapshot {
            credit_score,
            total_revenue,
            total_costs,
            wallet_balance,
            top_inventory,
            as_of: Utc::now(),
        })
    }

    /// Snapshot rendered as text, or the unavailable note on failure.
    pub async fn context(&self) -> String {
        match self.snapshot().await {
            Ok(snapshot) => narrative(&snapshot),
            Err(e) => {
                warn!(kind = %e.kind(), "Business context unavailable: {}", e);
                CONTEXT_UNAVAILABLE.to_string()
            }
        }
    }
}

/// Human-readable summary of a snapshot.
pub fn narrative(snapshot: &BusinessSnapshot) -> String {
    let mut text = String::from("Current Business State (on-chain):\n");
    let _ = writeln!(text, "- Credit score: {}/{}", snapshot.credit_score, SCORE_SCALE);
    let _ = writeln!(text, "- Total revenue: {} cUSD", format_units(snapshot.total_revenue));
    let _ = writeln!(text, "- Total costs: {} cUSD", format_units(snapshot.total_costs));

    if snapshot.total_revenue >= snapshot.total_costs {
        let _ = writeln!(
            text,
            "- Profit: {} cUSD",
            format_units(snapshot.total_revenue - snapshot.total_costs)
        );
    } else {
        let _ = writeln!(
            text,
            "- Loss: {} cUSD",
            format_units(snapshot.total_costs - snapshot.total_revenue)
        );
    }

    let _ = writeln!(text, "- Wallet balance: {} cUSD", format_units(snapshot.wallet_balance));

    if snapshot.top_inventory.is_empty() {
        text.push_str("- Inventory: Empty");
    } else {
        let stock = snapshot
            .top_inventory
            .iter()
            .map(|(item, quantity)| format!("{} ({})", item, quantity))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(text, "- Inventory: {}", stock);
    }

    text
}
