//! PAY_SUPPLIER: pay a known supplier for stock.

use super::units::to_base_units;
use super::{ledger_failure, parse_field, Action, ActionContext, ActionDescriptor};
use crate::ledger::WriteCall;
use crate::types::{ActionResult, Currency, ErrorKind, Field, Intent, IntentKind};
use async_trait::async_trait;
use tracing::{info, warn};

static DESCRIPTOR: ActionDescriptor = ActionDescriptor {
    name: "PAY_SUPPLIER",
    kind: IntentKind::PaySupplier,
    clarification: "I can pay a supplier for you. Tell me who, how much and for what, \
                    for example: 'Pay Bala 30 cUSD for onions'.",
};

pub struct PaySupplier;

#[async_trait]
impl Action for PaySupplier {
    fn descriptor(&self) -> &'static ActionDescriptor {
        &DESCRIPTOR
    }

    async fn execute(&self, intent: &Intent, ctx: &ActionContext<'_>) -> ActionResult {
        let (Some(supplier), Some(amount), Some(currency), Some(item)) = (
            intent.field(Field::Supplier),
            intent.field(Field::Amount),
            parse_field::<Currency>(intent, Field::Currency),
            intent.field(Field::Item),
        ) else {
            return DESCRIPTOR.unusable();
        };

        let Some(address) = ctx.directory.lookup(supplier).await else {
            warn!(supplier, "Unknown supplier");
            return ActionResult::clarify(
                format!(
                    "I don't have a payment address for {} yet. Add them to your supplier list and ask me again.",
                    supplier
                ),
                ErrorKind::Incomplete,
            );
        };

        let Some(amount_units) =
            to_base_units(amount, currency, ctx.settings.naira_per_base_unit)
        else {
            return DESCRIPTOR.unusable();
        };

        let quantity = parse_field::<u128>(intent, Field::Quantity)
            .unwrap_or(ctx.settings.default_supply_quantity);

        let call = WriteCall::PaySupplier {
            supplier: address,
            amount: amount_units,
            item: item.to_string(),
            quantity,
        };

        match ctx.ledger.call_write(&call).await {
            Ok(receipt) => {
                info!(supplier, item, %quantity, tx = %receipt.hash, "Supplier paid");
                ActionResult::success(
                    format!(
                        "Paid {} {} {} for {}. Your stock and costs are updated on-chain.",
                        supplier, amount, currency, item
                    ),
                    Some(receipt.hash),
                )
            }
            Err(e) => ledger_failure(DESCRIPTOR.name, &e),
        }
    }
}
