//! UPDATE_CREDIT_SCORE: ask the scoring contract to recompute.

use super::{ledger_failure, Action, ActionContext, ActionDescriptor};
use crate::ledger::WriteCall;
use crate::types::{ActionResult, Intent, IntentKind};
use async_trait::async_trait;
use tracing::info;

static DESCRIPTOR: ActionDescriptor = ActionDescriptor {
    name: "UPDATE_CREDIT_SCORE",
    kind: IntentKind::UpdateScore,
    clarification: "Say 'update my credit score' and I'll refresh it from your on-chain history.",
};

pub struct UpdateScore;

#[async_trait]
impl Action for UpdateScore {
    fn descriptor(&self) -> &'static ActionDescriptor {
        &DESCRIPTOR
    }

    async fn execute(&self, _intent: &Intent, ctx: &ActionContext<'_>) -> ActionResult {
        let call = WriteCall::CalculateScore {
            agent: ctx.settings.agent_address.clone(),
        };

        match ctx.ledger.call_write(&call).await {
            Ok(receipt) => {
                info!(tx = %receipt.hash, "Credit score recalculation submitted");
                ActionResult::success(
                    "Your credit score has been recalculated from your latest sales and payments. \
                     Ask for a business summary to see the new figure.",
                    Some(receipt.hash),
                )
            }
            Err(e) => ledger_failure(DESCRIPTOR.name, &e),
        }
    }
}
