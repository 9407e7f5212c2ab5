//! Host-facing agent: one inbound message in, one reply out.
//!
//! Also exposes the per-action `validate`/`handle` entry points a host
//! runtime uses when it has already picked the action itself.

use crate::actions::{ActionRouter, RouterSettings};
use crate::intent::IntentExtractor;
use crate::ledger::Ledger;
use crate::registry::SupplierDirectory;
use crate::state::BusinessStateAggregator;
use crate::types::{ActionResult, InboundMessage, IntentKind, Reply};
use std::sync::Arc;
use tracing::info;

pub struct MarketAgent {
    extractor: IntentExtractor,
    router: Arc<ActionRouter>,
    aggregator: Arc<BusinessStateAggregator>,
}

impl MarketAgent {
    pub fn new(router: Arc<ActionRouter>, aggregator: Arc<BusinessStateAggregator>) -> Self {
        Self {
            extractor: IntentExtractor::new(),
            router,
            aggregator,
        }
    }

    /// Wire router and aggregator over one shared ledger.
    pub fn with_ledger(
        ledger: Arc<dyn Ledger>,
        directory: Arc<dyn SupplierDirectory>,
        settings: RouterSettings,
    ) -> Self {
        let router = Arc::new(ActionRouter::new(ledger.clone(), directory, settings));
        let aggregator = Arc::new(BusinessStateAggregator::new(ledger));
        Self::new(router, aggregator)
    }

    pub fn router(&self) -> Arc<ActionRouter> {
        Arc::clone(&self.router)
    }

    pub fn aggregator(&self) -> Arc<BusinessStateAggregator> {
        Arc::clone(&self.aggregator)
    }

    /// Classify the message, run at most one action, and phrase the reply.
    pub async fn handle_message(&self, message: &InboundMessage) -> Reply {
        let intent = self.extractor.extract(&message.text);
        info!(kind = %intent.kind(), confidence = ?intent.confidence(), "Inbound message");
        let result = self.router.route(&intent).await;
        self.reply(intent.kind(), result)
    }

    /// Whether `text` looks like a request for `kind`.
    pub fn validate(&self, kind: IntentKind, text: &str) -> bool {
        self.router.validate(kind, text)
    }

    /// Run `kind` against `text` without classifying first.
    pub async fn handle_as(&self, kind: IntentKind, text: &str) -> Reply {
        let intent = self.extractor.extract_as(kind, text);
        let result = self.router.route(&intent).await;
        self.reply(kind, result)
    }

    /// Business-state narrative for the conversation context.
    pub async fn business_context(&self) -> String {
        self.aggregator.context().await
    }

    fn reply(&self, kind: IntentKind, result: ActionResult) -> Reply {
        let action_tag = if result.is_success() {
            self.router.descriptor(kind).map(|d| d.success_tag())
        } else {
            None
        };

        Reply {
            text: result.message,
            action_tag,
        }
    }
}
