//! Routes a classified intent to the one catalog action that handles it.

use super::{default_catalog, Action, ActionContext, ActionDescriptor};
use crate::ledger::Ledger;
use crate::registry::SupplierDirectory;
use crate::types::{ActionResult, ErrorKind, Intent, IntentKind};
use std::sync::Arc;
use tracing::{info, info_span, Instrument};

const HELP: &str = "I can record sales, pay suppliers, request loans, refresh your credit \
                    score and give business advice. Try: 'I sold 10 tomatoes for 500 naira'.";

/// Values the actions need besides the ledger itself.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    /// Address of the vendor's agent contract, used for eligibility and scoring.
    pub agent_address: String,
    pub naira_per_base_unit: u128,
    pub default_supply_quantity: u128,
    pub margin_threshold_pct: u128,
    pub low_stock_threshold: u128,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            agent_address: String::new(),
            naira_per_base_unit: 1500,
            default_supply_quantity: 100,
            margin_threshold_pct: 20,
            low_stock_threshold: 20,
        }
    }
}

pub struct ActionRouter {
    catalog: Vec<Box<dyn Action>>,
    ledger: Arc<dyn Ledger>,
    directory: Arc<dyn SupplierDirectory>,
    settings: RouterSettings,
}

impl ActionRouter {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        directory: Arc<dyn SupplierDirectory>,
        settings: RouterSettings,
    ) -> Self {
        Self {
            catalog: default_catalog(),
            ledger,
            directory,
            settings,
        }
    }

    /// Descriptors in catalog order.
    pub fn descriptors(&self) -> impl Iterator<Item = &'static ActionDescriptor> + '_ {
        self.catalog.iter().map(|a| a.descriptor())
    }

    pub fn descriptor(&self, kind: IntentKind) -> Option<&'static ActionDescriptor> {
        self.descriptors().find(|d| d.kind == kind)
    }

    /// Host-side pre-check: does `text` look like a request for `kind`?
    pub fn validate(&self, kind: IntentKind, text: &str) -> bool {
        self.descriptor(kind).is_some_and(|d| d.matches(text))
    }

    /// Execute exactly one action for `intent`.
    ///
    /// Unknown or incomplete intents never touch the ledger.
    pub async fn route(&self, intent: &Intent) -> ActionResult {
        let span = info_span!("action", id = %ulid::Ulid::new(), kind = %intent.kind());
        self.dispatch(intent).instrument(span).await
    }

    async fn dispatch(&self, intent: &Intent) -> ActionResult {
        let Some(action) = self
            .catalog
            .iter()
            .find(|a| a.descriptor().kind == intent.kind())
        else {
            info!("No action for message");
            return ActionResult::clarify(HELP, ErrorKind::Incomplete);
        };

        let descriptor = action.descriptor();
        if let Some(clarification) = descriptor.clarification_for(intent) {
            info!(missing = ?intent.missing_fields(), "Asking for clarification");
            return clarification;
        }

        let ctx = ActionContext {
            ledger: self.ledger.as_ref(),
            directory: self.directory.as_ref(),
            settings: &self.settings,
        };
        let result = action.execute(intent, &ctx).await;
        info!(
            action = descriptor.name,
            outcome = ?result.outcome,
            tx = result.tx_hash.as_deref().unwrap_or("-"),
            "Action finished"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::units::UNIT;
    use crate::actions::LEDGER_APOLOGY;
    use crate::intent::IntentExtractor;
    use crate::ledger::mock::MockLedger;
    use crate::ledger::{GatewayError, ReadCall, WriteCall};
    use crate::registry::StaticDirectory;
    use crate::types::{Field, Outcome};

    const AGENT: &str = "0x308597EB73a6bA43DBaA658aD6f9292dBf428284";
    const BALA: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79ee";

    fn router(ledger: Arc<MockLedger>) -> ActionRouter {
        let settings = RouterSettings {
            agent_address: AGENT.into(),
            ..RouterSettings::default()
        };
        ActionRouter::new(ledger, Arc::new(StaticDirectory::new([("Bala", BALA)])), settings)
    }

    async fn route_text(router: &ActionRouter, text: &str) -> ActionResult {
        router.route(&IntentExtractor::new().extract(text)).await
    }

    #[tokio::test]
    async fn records_sale_in_base_units() {
        let ledger = Arc::new(MockLedger::default());
        let result = route_text(&router(ledger.clone()), "I sold 10 tomatoes for 500 naira").await;

        assert_eq!(result.outcome, Outcome::Success);
        assert!(result.message.contains("10 tomatoes"));
        assert!(result.message.contains("500"));
        assert!(result.tx_hash.is_some());
        assert_eq!(
            ledger.last_write(),
            Some(WriteCall::RecordSale {
                item: "tomatoes".into(),
                quantity: 10,
                price: 333_333_333_333_333_333,
            })
        );
    }

    #[tokio::test]
    async fn incomplete_sale_asks_without_touching_ledger() {
        let ledger = Arc::new(MockLedger::default());
        let result = route_text(&router(ledger.clone()), "I sold some tomatoes").await;

        assert_eq!(result.outcome, Outcome::NeedsClarification);
        assert_eq!(result.error_kind, Some(ErrorKind::Incomplete));
        assert!(result.message.contains("I sold 10 tomatoes for 500 naira"));
        assert_eq!(ledger.read_count() + ledger.write_count(), 0);
    }

    #[tokio::test]
    async fn unknown_intent_gets_help_menu() {
        let ledger = Arc::new(MockLedger::default());
        let result = route_text(&router(ledger.clone()), "what's the weather like?").await;

        assert_eq!(result.outcome, Outcome::NeedsClarification);
        assert!(result.message.contains("record sales"));
        assert_eq!(ledger.read_count() + ledger.write_count(), 0);
    }

    #[tokio::test]
    async fn pays_known_supplier_with_default_quantity() {
        let ledger = Arc::new(MockLedger::default());
        let result = route_text(&router(ledger.clone()), "Pay Bala 30 cUSD for onions").await;

        assert!(result.is_success());
        assert_eq!(
            ledger.last_write(),
            Some(WriteCall::PaySupplier {
                supplier: BALA.into(),
                amount: 30 * UNIT,
                item: "onions".into(),
                quantity: 100,
            })
        );
    }

    #[tokio::test]
    async fn unknown_supplier_is_never_paid() {
        let ledger = Arc::new(MockLedger::default());
        let result = route_text(&router(ledger.clone()), "Pay Musa 30 cUSD for onions").await;

        assert_eq!(result.outcome, Outcome::NeedsClarification);
        assert!(result.message.contains("Musa"));
        assert_eq!(ledger.write_count(), 0);
    }

    #[tokio::test]
    async fn ineligible_loan_stops_before_write() {
        let mut mock = MockLedger::default();
        mock.terms.eligible = false;
        let ledger = Arc::new(mock);
        let result = route_text(&router(ledger.clone()), "I need a loan of 200 cUSD").await;

        assert_eq!(result.outcome, Outcome::Failed);
        assert_eq!(result.error_kind, Some(ErrorKind::Ineligible));
        assert!(result.message.contains("credit score"));
        assert_eq!(ledger.write_count(), 0);
        assert_eq!(
            ledger.reads.lock().unwrap().as_slice(),
            &[ReadCall::CheckEligibility { agent: AGENT.into() }]
        );
    }

    #[tokio::test]
    async fn loan_above_limit_offers_the_maximum() {
        let ledger = Arc::new(MockLedger::default());
        let result = route_text(&router(ledger.clone()), "I need a loan of 900 cUSD").await;

        assert_eq!(result.outcome, Outcome::NeedsClarification);
        assert_eq!(result.error_kind, Some(ErrorKind::Ineligible));
        assert!(result.message.contains("500"));
        assert_eq!(ledger.write_count(), 0);
    }

    #[tokio::test]
    async fn eligible_loan_is_requested_once() {
        let ledger = Arc::new(MockLedger::default());
        let result = route_text(&router(ledger.clone()), "I need a loan of 200 cUSD").await;

        assert!(result.is_success());
        assert_eq!(ledger.write_count(), 1);
        assert_eq!(
            ledger.last_write(),
            Some(WriteCall::RequestLoan { amount: 200 * UNIT })
        );
    }

    #[tokio::test]
    async fn score_refresh_targets_agent() {
        let ledger = Arc::new(MockLedger::default());
        let result = route_text(&router(ledger.clone()), "Please update my credit score").await;

        assert!(result.is_success());
        assert!(result.message.contains("recalculated"));
        assert_eq!(
            ledger.last_write(),
            Some(WriteCall::CalculateScore { agent: AGENT.into() })
        );
    }

    #[tokio::test]
    async fn advice_orders_margin_then_stock_then_tip() {
        let mut mock = MockLedger::default();
        mock.margin = 15;
        mock.inventory = vec![("Rice".into(), 5), ("Beans".into(), 50)];
        let ledger = Arc::new(mock);
        let result = route_text(&router(ledger.clone()), "Any advice for me?").await;

        assert!(result.is_success());
        let text = &result.message;
        let margin = text.find("15%").unwrap();
        let stock = text.find("only 5 Rice").unwrap();
        let tip = text.find("weekends").unwrap();
        assert!(margin < stock && stock < tip);
        assert!(text.contains("below the 20%"));
        assert_eq!(ledger.write_count(), 0);
    }

    #[tokio::test]
    async fn advice_without_low_stock_skips_alert() {
        let ledger = Arc::new(MockLedger::default());
        let result = route_text(&router(ledger.clone()), "how am I doing?").await;

        assert!(result.message.contains("33%"));
        assert!(result.message.contains("healthy"));
        assert!(!result.message.contains("Low stock"));
        assert!(result.tx_hash.is_none());
    }

    #[tokio::test]
    async fn ledger_failure_is_not_leaked() {
        let mut mock = MockLedger::default();
        mock.write_error = Some(GatewayError::Rejected("-32000: nonce too low".into()));
        let ledger = Arc::new(mock);
        let result = route_text(&router(ledger.clone()), "I sold 10 tomatoes for 500 naira").await;

        assert_eq!(result.outcome, Outcome::Failed);
        assert_eq!(result.error_kind, Some(ErrorKind::Rejected));
        assert_eq!(result.message, LEDGER_APOLOGY);
        assert_eq!(ledger.write_count(), 1);
    }

    #[tokio::test]
    async fn advice_read_failure_is_network_error() {
        let mut mock = MockLedger::default();
        mock.failing_reads.insert("getProfitMargin");
        let ledger = Arc::new(mock);
        let result = route_text(&router(ledger.clone()), "any tips?").await;

        assert_eq!(result.outcome, Outcome::Failed);
        assert_eq!(result.error_kind, Some(ErrorKind::NetworkError));
    }

    #[tokio::test]
    async fn synthesized_intents_route_like_extracted_ones() {
        let ledger = Arc::new(MockLedger::default());
        let intent = Intent::synthesized(
            IntentKind::PaySupplier,
            [
                (Field::Supplier, "bala"),
                (Field::Amount, "0.001"),
                (Field::Currency, "cusd"),
                (Field::Item, "Rice"),
                (Field::Quantity, "20"),
            ],
        );
        let result = router(ledger.clone()).route(&intent).await;

        assert!(result.is_success());
        assert_eq!(
            ledger.last_write(),
            Some(WriteCall::PaySupplier {
                supplier: BALA.into(),
                amount: UNIT / 1000,
                item: "Rice".into(),
                quantity: 20,
            })
        );
    }

    #[test]
    fn validate_uses_keywords() {
        let ledger = Arc::new(MockLedger::default());
        let router = router(ledger);
        assert!(router.validate(IntentKind::RequestLoan, "can I borrow money"));
        assert!(!router.validate(IntentKind::RequestLoan, "I sold rice"));
        assert!(!router.validate(IntentKind::Unknown, "anything"));
        assert!(router.validate(IntentKind::PaySupplier, "order 20 onions from Bala"));
        assert_eq!(router.descriptors().count(), 5);
    }

    #[tokio::test]
    async fn order_without_price_asks_for_clarification() {
        let ledger = Arc::new(MockLedger::default());
        let router = router(ledger.clone());
        let intent = IntentExtractor::new().extract("order 20 onions from Bala");

        let result = router.route(&intent).await;
        assert_eq!(result.outcome, Outcome::NeedsClarification);
        assert_eq!(ledger.write_count(), 0);
        assert_eq!(ledger.read_count(), 0);
    }

    #[test]
    fn completeness_gate_follows_descriptor_fields() {
        let ledger = Arc::new(MockLedger::default());
        let router = router(ledger);
        let descriptor = router.descriptor(IntentKind::RequestLoan).unwrap();
        assert_eq!(descriptor.required_fields(), &[Field::Amount, Field::Currency]);

        let partial = Intent::synthesized(IntentKind::RequestLoan, [(Field::Amount, "50".to_string())]);
        assert!(descriptor.clarification_for(&partial).is_some());

        let full = IntentExtractor::new().extract("I need a loan of 50 cUSD");
        assert!(descriptor.clarification_for(&full).is_none());
    }
}
