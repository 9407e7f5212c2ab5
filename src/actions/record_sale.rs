//! RECORD_SALE: write a sale to the business ledger.

use super::units::to_base_units;
use super::{ledger_failure, parse_field, Action, ActionContext, ActionDescriptor};
use crate::ledger::WriteCall;
use crate::types::{ActionResult, Currency, Field, Intent, IntentKind};
use async_trait::async_trait;
use tracing::info;

static DESCRIPTOR: ActionDescriptor = ActionDescriptor {
    name: "RECORD_SALE",
    kind: IntentKind::RecordSale,
    clarification: "I can record that sale. Tell me the quantity, item and price, \
                    for example: 'I sold 10 tomatoes for 500 naira'.",
};

pub struct RecordSale;

#[async_trait]
impl Action for RecordSale {
    fn descriptor(&self) -> &'static ActionDescriptor {
        &DESCRIPTOR
    }

    async fn execute(&self, intent: &Intent, ctx: &ActionContext<'_>) -> ActionResult {
        let (Some(item), Some(quantity), Some(amount), Some(currency)) = (
            intent.field(Field::Item),
            parse_field::<u128>(intent, Field::Quantity),
            intent.field(Field::Amount),
            parse_field::<Currency>(intent, Field::Currency),
        ) else {
            return DESCRIPTOR.unusable();
        };

        let Some(price) = to_base_units(amount, currency, ctx.settings.naira_per_base_unit) else {
            return DESCRIPTOR.unusable();
        };

        let call = WriteCall::RecordSale {
            item: item.to_string(),
            quantity,
            price,
        };

        match ctx.ledger.call_write(&call).await {
            Ok(receipt) => {
                info!(item, %quantity, %price, tx = %receipt.hash, "Sale recorded");
                ActionResult::success(
                    format!(
                        "Recorded your sale of {} {} for {} {}. Revenue and inventory are updated on-chain.",
                        quantity, item, amount, currency
                    ),
                    Some(receipt.hash),
                )
            }
            Err(e) => ledger_failure(DESCRIPTOR.name, &e),
        }
    }
}
