//! Action catalog: the fixed set of business operations and their router.
//!
//! Every action shares one descriptor shape and one completeness check; the
//! per-action code only builds its call and phrases the reply.

pub mod get_advice;
pub mod pay_supplier;
pub mod record_sale;
pub mod request_loan;
pub mod router;
pub mod units;
pub mod update_score;

pub use router::{ActionRouter, RouterSettings};

use crate::intent;
use crate::ledger::{GatewayError, Ledger};
use crate::registry::SupplierDirectory;
use crate::types::{ActionResult, ErrorKind, Field, Intent, IntentKind};
use async_trait::async_trait;
use std::str::FromStr;
use tracing::error;

/// The only thing an end user ever sees about a ledger failure.
pub const LEDGER_APOLOGY: &str =
    "Sorry, I couldn't complete that on the ledger just now. Please try again in a moment.";

/// Static description of one action.
#[derive(Debug)]
pub struct ActionDescriptor {
    /// Host-facing action name, e.g. `RECORD_SALE`.
    pub name: &'static str,
    pub kind: IntentKind,
    /// Example phrasing returned when required fields are missing.
    pub clarification: &'static str,
}

impl ActionDescriptor {
    pub fn required_fields(&self) -> &'static [Field] {
        self.kind.required_fields()
    }

    /// Whether `text` looks like a request for this action.
    pub fn matches(&self, text: &str) -> bool {
        intent::matches_kind(self.kind, text)
    }

    /// Tag attached to successful replies.
    pub fn success_tag(&self) -> String {
        format!("{}_SUCCESS", self.name)
    }

    /// Shared completeness gate: a clarification if any required field is
    /// missing, otherwise `None`.
    pub fn clarification_for(&self, intent: &Intent) -> Option<ActionResult> {
        let complete = self
            .required_fields()
            .iter()
            .all(|field| intent.field(*field).is_some());
        if complete {
            None
        } else {
            Some(ActionResult::clarify(self.clarification, ErrorKind::Incomplete))
        }
    }

    /// Clarification used when a present field cannot be interpreted.
    pub(crate) fn unusable(&self) -> ActionResult {
        ActionResult::clarify(self.clarification, ErrorKind::Incomplete)
    }
}

/// Collaborators an action may use while executing.
pub struct ActionContext<'a> {
    pub ledger: &'a dyn Ledger,
    pub directory: &'a dyn SupplierDirectory,
    pub settings: &'a RouterSettings,
}

/// One business operation.
#[async_trait]
pub trait Action: Send + Sync {
    fn descriptor(&self) -> &'static ActionDescriptor;

    /// Run against a complete intent. Issues at most one write.
    async fn execute(&self, intent: &Intent, ctx: &ActionContext<'_>) -> ActionResult;
}

/// The catalog in priority order.
pub fn default_catalog() -> Vec<Box<dyn Action>> {
    vec![
        Box::new(record_sale::RecordSale),
        Box::new(pay_supplier::PaySupplier),
        Box::new(request_loan::RequestLoan),
        Box::new(update_score::UpdateScore),
        Box::new(get_advice::GetAdvice),
    ]
}

/// Parse a field into `T`.
pub(crate) fn parse_field<T: FromStr>(intent: &Intent, field: Field) -> Option<T> {
    intent.field(field)?.parse().ok()
}

/// Log the real failure for operators and hand the user the apology.
pub(crate) fn ledger_failure(action: &str, err: &GatewayError) -> ActionResult {
    error!(action, kind = %err.kind(), "Ledger call failed: {}", err);
    ActionResult::failed(LEDGER_APOLOGY, err.kind())
}
