//! GET_ADVICE: read-only coaching from margin and stock levels.

use super::{ledger_failure, Action, ActionContext, ActionDescriptor};
use crate::ledger::{self, ReadCall};
use crate::types::{ActionResult, Intent, IntentKind, InventoryRecord};
use async_trait::async_trait;
use tracing::debug;

static DESCRIPTOR: ActionDescriptor = ActionDescriptor {
    name: "GET_ADVICE",
    kind: IntentKind::GetAdvice,
    clarification: "Ask me 'how am I doing?' or 'any advice?' for tips on your business.",
};

const WEEKEND_TIP: &str = "Tip: weekends are usually busier at the market. Stock up on your \
                           fastest sellers on Friday so you don't run out.";

pub struct GetAdvice;

#[async_trait]
impl Action for GetAdvice {
    fn descriptor(&self) -> &'static ActionDescriptor {
        &DESCRIPTOR
    }

    async fn execute(&self, _intent: &Intent, ctx: &ActionContext<'_>) -> ActionResult {
        let reads = tokio::try_join!(
            ledger::read_uint(ctx.ledger, ReadCall::ProfitMargin),
            ledger::read_items(ctx.ledger),
        );
        let (margin, items) = match reads {
            Ok(values) => values,
            Err(e) => return ledger_failure(DESCRIPTOR.name, &e),
        };

        let first = match items.first() {
            Some(item) => match ledger::read_inventory(ctx.ledger, item).await {
                Ok(record) => Some(record),
                Err(e) => return ledger_failure(DESCRIPTOR.name, &e),
            },
            None => None,
        };

        debug!(%margin, items = items.len(), "Composing advice");

        let mut paragraphs = vec![margin_paragraph(margin, ctx.settings.margin_threshold_pct)];
        if let Some(alert) = first
            .as_ref()
            .and_then(|record| stock_paragraph(record, ctx.settings.low_stock_threshold))
        {
            paragraphs.push(alert);
        }
        paragraphs.push(WEEKEND_TIP.to_string());

        ActionResult::success(paragraphs.join("\n\n"), None)
    }
}

fn margin_paragraph(margin: u128, threshold: u128) -> String {
    if margin >= threshold {
        format!(
            "Your profit margin is {}%, which is healthy. Keep your prices steady \
             and consider growing the items that sell fastest.",
            margin
        )
    } else {
        format!(
            "Your profit margin is {}%, below the {}% we'd like to see. Try buying in \
             bulk from your suppliers or raising prices slightly on popular items.",
            margin, threshold
        )
    }
}

fn stock_paragraph(record: &InventoryRecord, threshold: u128) -> Option<String> {
    (record.quantity < threshold).then(|| {
        format!(
            "Low stock alert: only {} {} left. Restock soon so you don't miss sales.",
            record.quantity, record.item
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(item: &str, quantity: u128) -> InventoryRecord {
        InventoryRecord {
            item: item.into(),
            quantity,
            cost_basis: 0,
            last_updated: 0,
        }
    }

    #[test]
    fn margin_threshold_is_inclusive() {
        assert!(margin_paragraph(20, 20).contains("healthy"));
        assert!(margin_paragraph(19, 20).contains("below the 20%"));
    }

    #[test]
    fn stock_alert_only_below_threshold() {
        assert!(stock_paragraph(&record("Rice", 20), 20).is_none());
        let alert = stock_paragraph(&record("Rice", 5), 20).unwrap();
        assert!(alert.contains("only 5 Rice"));
    }
}
