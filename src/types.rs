//! Shared types used across the marketmind runtime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Intents
// ---------------------------------------------------------------------------

/// The business operation a message asks for.
///
/// Declaration order is the extractor's priority order: the first kind whose
/// keywords match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    RecordSale,
    PaySupplier,
    RequestLoan,
    UpdateScore,
    GetAdvice,
    Unknown,
}

impl IntentKind {
    /// Every kind in priority order.
    pub const ALL: [IntentKind; 6] = [
        Self::RecordSale,
        Self::PaySupplier,
        Self::RequestLoan,
        Self::UpdateScore,
        Self::GetAdvice,
        Self::Unknown,
    ];

    /// Fields that must be present before the action may touch the ledger.
    pub fn required_fields(self) -> &'static [Field] {
        match self {
            Self::RecordSale => &[Field::Item, Field::Quantity, Field::Amount, Field::Currency],
            Self::PaySupplier => &[Field::Supplier, Field::Amount, Field::Currency, Field::Item],
            Self::RequestLoan => &[Field::Amount, Field::Currency],
            Self::UpdateScore | Self::GetAdvice | Self::Unknown => &[],
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RecordSale => write!(f, "record_sale"),
            Self::PaySupplier => write!(f, "pay_supplier"),
            Self::RequestLoan => write!(f, "request_loan"),
            Self::UpdateScore => write!(f, "update_score"),
            Self::GetAdvice => write!(f, "get_advice"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Named slots an intent can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Item,
    Quantity,
    Amount,
    Currency,
    Supplier,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Item => write!(f, "item"),
            Self::Quantity => write!(f, "quantity"),
            Self::Amount => write!(f, "amount"),
            Self::Currency => write!(f, "currency"),
            Self::Supplier => write!(f, "supplier"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Every required field for the kind was resolved.
    Complete,
    /// At least one required field is missing.
    Incomplete,
}

/// A structured interpretation of free text.
///
/// Immutable once built; consumers only read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    kind: IntentKind,
    fields: BTreeMap<Field, String>,
    confidence: Confidence,
}

impl Intent {
    /// Build an intent, deriving confidence from the kind's required fields.
    pub fn new(kind: IntentKind, fields: BTreeMap<Field, String>) -> Self {
        let confidence = if kind
            .required_fields()
            .iter()
            .all(|field| fields.contains_key(field))
        {
            Confidence::Complete
        } else {
            Confidence::Incomplete
        };

        Self {
            kind,
            fields,
            confidence,
        }
    }

    /// Build an intent from `(field, value)` pairs (used by the decision loop).
    pub fn synthesized<I, V>(kind: IntentKind, pairs: I) -> Self
    where
        I: IntoIterator<Item = (Field, V)>,
        V: Into<String>,
    {
        let fields = pairs.into_iter().map(|(k, v)| (k, v.into())).collect();
        Self::new(kind, fields)
    }

    pub fn kind(&self) -> IntentKind {
        self.kind
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    pub fn field(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<Field, String> {
        &self.fields
    }

    /// Required fields of this intent's kind that were not resolved.
    pub fn missing_fields(&self) -> Vec<Field> {
        self.kind
            .required_fields()
            .iter()
            .copied()
            .filter(|field| !self.fields.contains_key(field))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Currencies
// ---------------------------------------------------------------------------

/// Currency words the extractor recognises after an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    Cusd,
    Celo,
    Naira,
    Dollar,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cusd => write!(f, "cUSD"),
            Self::Celo => write!(f, "CELO"),
            Self::Naira => write!(f, "naira"),
            Self::Dollar => write!(f, "dollars"),
        }
    }
}

impl FromStr for Currency {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cusd" => Ok(Self::Cusd),
            "celo" => Ok(Self::Celo),
            "naira" => Ok(Self::Naira),
            "dollar" | "dollars" => Ok(Self::Dollar),
            _ => Err(()),
        }
    }
}

impl Currency {
    /// Canonical lowercase token stored in intent fields.
    pub fn as_token(self) -> &'static str {
        match self {
            Self::Cusd => "cusd",
            Self::Celo => "celo",
            Self::Naira => "naira",
            Self::Dollar => "dollar",
        }
    }
}

// ---------------------------------------------------------------------------
// Action results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    NeedsClarification,
    Failed,
}

/// Failure taxonomy shared by the router, gateway and decision loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Intent is missing required fields; never reaches the chain.
    Incomplete,
    /// A precondition read said no; never reaches a write.
    Ineligible,
    /// Transport or RPC failure.
    NetworkError,
    /// The ledger reverted or refused the call.
    Rejected,
    /// Write submitted but not confirmed within the bound.
    Timeout,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incomplete => write!(f, "incomplete"),
            Self::Ineligible => write!(f, "ineligible"),
            Self::NetworkError => write!(f, "network_error"),
            Self::Rejected => write!(f, "rejected"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// Terminal result of routing one intent. Never retried by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub outcome: Outcome,
    pub message: String,
    pub tx_hash: Option<String>,
    pub error_kind: Option<ErrorKind>,
}

impl ActionResult {
    pub fn success(message: impl Into<String>, tx_hash: Option<String>) -> Self {
        Self {
            outcome: Outcome::Success,
            message: message.into(),
            tx_hash,
            error_kind: None,
        }
    }

    pub fn clarify(message: impl Into<String>, error_kind: ErrorKind) -> Self {
        Self {
            outcome: Outcome::NeedsClarification,
            message: message.into(),
            tx_hash: None,
            error_kind: Some(error_kind),
        }
    }

    pub fn failed(message: impl Into<String>, error_kind: ErrorKind) -> Self {
        Self {
            outcome: Outcome::Failed,
            message: message.into(),
            tx_hash: None,
            error_kind: Some(error_kind),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

// ---------------------------------------------------------------------------
// Ledger read models
// ---------------------------------------------------------------------------

/// One row of on-chain inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub item: String,
    pub quantity: u128,
    pub cost_basis: u128,
    pub last_updated: u128,
}

/// Loan eligibility and terms from a single read. Consumed once, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Maximum principal in smallest units.
    pub max_amount: u128,
    pub interest_rate: u128,
    pub duration_seconds: u128,
    pub eligible: bool,
}

/// A consistent read of the aggregate business metrics.
///
/// Rebuilt on every request; amounts are in smallest units (18 decimals).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessSnapshot {
    pub credit_score: u128,
    pub total_revenue: u128,
    pub total_costs: u128,
    pub wallet_balance: u128,
    /// At most three `(item, quantity)` pairs, in ledger order.
    pub top_inventory: Vec<(String, u128)>,
    pub as_of: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Host boundary
// ---------------------------------------------------------------------------

/// A message delivered by the host runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub text: String,
}

impl InboundMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Reply handed back to the host runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_tag: Option<String>,
}
