//! REQUEST_LOAN: check eligibility, then draw a micro-loan.

use super::units::{format_units, to_base_units};
use super::{ledger_failure, parse_field, Action, ActionContext, ActionDescriptor};
use crate::ledger::{self, WriteCall};
use crate::types::{ActionResult, Currency, ErrorKind, Field, Intent, IntentKind};
use async_trait::async_trait;
use tracing::info;

static DESCRIPTOR: ActionDescriptor = ActionDescriptor {
    name: "REQUEST_LOAN",
    kind: IntentKind::RequestLoan,
    clarification: "I can request a loan for you. Tell me how much, \
                    for example: 'I need a loan of 200 cUSD'.",
};

const NOT_ELIGIBLE: &str = "You're not eligible for a loan yet. Keep recording sales and \
                            paying suppliers on time to build your credit score, then ask again.";

pub struct RequestLoan;

#[async_trait]
impl Action for RequestLoan {
    fn descriptor(&self) -> &'static ActionDescriptor {
        &DESCRIPTOR
    }

    async fn execute(&self, intent: &Intent, ctx: &ActionContext<'_>) -> ActionResult {
        let (Some(amount), Some(currency)) = (
            intent.field(Field::Amount),
            parse_field::<Currency>(intent, Field::Currency),
        ) else {
            return DESCRIPTOR.unusable();
        };

        let Some(requested) = to_base_units(amount, currency, ctx.settings.naira_per_base_unit)
        else {
            return DESCRIPTOR.unusable();
        };

        // Terms are read fresh for every request.
        let terms = match ledger::read_terms(ctx.ledger, &ctx.settings.agent_address).await {
            Ok(terms) => terms,
            Err(e) => return ledger_failure(DESCRIPTOR.name, &e),
        };

        if !terms.eligible {
            info!("Loan refused: not eligible");
            return ActionResult::failed(NOT_ELIGIBLE, ErrorKind::Ineligible);
        }

        if requested > terms.max_amount {
            info!(%requested, max = %terms.max_amount, "Loan refused: above limit");
            return ActionResult::clarify(
                format!(
                    "Based on your credit score you can borrow up to {} cUSD right now. \
                     Would you like to request that amount instead?",
                    format_units(terms.max_amount)
                ),
                ErrorKind::Ineligible,
            );
        }

        match ctx
            .ledger
            .call_write(&WriteCall::RequestLoan { amount: requested })
            .await
        {
            Ok(receipt) => {
                info!(%requested, tx = %receipt.hash, "Loan disbursed");
                ActionResult::success(
                    format!(
                        "Your interest-free loan of {} {} is approved and on its way to your business wallet.",
                        amount, currency
                    ),
                    Some(receipt.hash),
                )
            }
            Err(e) => ledger_failure(DESCRIPTOR.name, &e),
        }
    }
}
