//! Ledger access: typed contract calls and the gateway that executes them.

pub mod abi;
pub mod gateway;
pub mod rpc;
pub mod tx;

#[cfg(test)]
pub(crate) mod mock;

pub use gateway::{ChainGateway, GatewaySettings, PendingTransaction};
pub use rpc::{HttpTransport, RpcError, RpcTransport};

use crate::types::{ErrorKind, InventoryRecord, LoanTerms};
use abi::{AbiError, Token};
use async_trait::async_trait;
use thiserror::Error;

/// Why a ledger call did not produce a value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),
    #[error("rejected by ledger: {0}")]
    Rejected(String),
    #[error("confirmation not observed within bound for {hash}")]
    Timeout { hash: String },
    #[error("malformed ledger response: {0}")]
    Malformed(String),
}

impl GatewayError {
    /// Operator-facing classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) | Self::Malformed(_) => ErrorKind::NetworkError,
            Self::Rejected(_) => ErrorKind::Rejected,
            Self::Timeout { .. } => ErrorKind::Timeout,
        }
    }
}

impl From<AbiError> for GatewayError {
    fn from(e: AbiError) -> Self {
        Self::Malformed(e.to_string())
    }
}

impl From<RpcError> for GatewayError {
    fn from(e: RpcError) -> Self {
        match e {
            RpcError::Transport(msg) => Self::Network(msg),
            RpcError::Node { code, message } => Self::Rejected(format!("{}: {}", code, message)),
            RpcError::Malformed(msg) => Self::Malformed(msg),
        }
    }
}

/// Deployed contract addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractAddresses {
    pub agent: String,
    pub lending: String,
    pub scoring: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contract {
    Agent,
    Lending,
    Scoring,
}

impl ContractAddresses {
    pub fn address_of(&self, contract: Contract) -> &str {
        match contract {
            Contract::Agent => &self.agent,
            Contract::Lending => &self.lending,
            Contract::Scoring => &self.scoring,
        }
    }
}

// ---------------------------------------------------------------------------
// Read calls
// ---------------------------------------------------------------------------

/// A view call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadCall {
    CreditScore,
    TotalRevenue,
    TotalCosts,
    Balance,
    ProfitMargin,
    InventoryItems,
    Inventory { item: String },
    CheckEligibility { agent: String },
}

/// Decoded result of a [`ReadCall`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerValue {
    Uint(u128),
    Items(Vec<String>),
    Inventory(InventoryRecord),
    Eligibility(LoanTerms),
}

impl LedgerValue {
    pub fn into_uint(self) -> Result<u128, GatewayError> {
        match self {
            Self::Uint(v) => Ok(v),
            other => Err(unexpected("uint", &other)),
        }
    }

    pub fn into_items(self) -> Result<Vec<String>, GatewayError> {
        match self {
            Self::Items(v) => Ok(v),
            other => Err(unexpected("string[]", &other)),
        }
    }

    pub fn into_inventory(self) -> Result<InventoryRecord, GatewayError> {
        match self {
            Self::Inventory(v) => Ok(v),
            other => Err(unexpected("inventory", &other)),
        }
    }

    pub fn into_terms(self) -> Result<LoanTerms, GatewayError> {
        match self {
            Self::Eligibility(v) => Ok(v),
            other => Err(unexpected("eligibility", &other)),
        }
    }
}

fn unexpected(wanted: &str, got: &LedgerValue) -> GatewayError {
    GatewayError::Malformed(format!("expected {}, got {:?}", wanted, got))
}

impl ReadCall {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreditScore => "creditScore",
            Self::TotalRevenue => "totalRevenue",
            Self::TotalCosts => "totalCosts",
            Self::Balance => "getBalance",
            Self::ProfitMargin => "getProfitMargin",
            Self::InventoryItems => "getAllInventoryItems",
            Self::Inventory { .. } => "getInventory",
            Self::CheckEligibility { .. } => "checkEligibility",
        }
    }

    pub fn contract(&self) -> Contract {
        match self {
            Self::CheckEligibility { .. } => Contract::Lending,
            _ => Contract::Agent,
        }
    }

    pub fn signature(&self) -> &'static str {
        match self {
            Self::CreditScore => "creditScore()",
            Self::TotalRevenue => "totalRevenue()",
            Self::TotalCosts => "totalCosts()",
            Self::Balance => "getBalance()",
            Self::ProfitMargin => "getProfitMargin()",
            Self::InventoryItems => "getAllInventoryItems()",
            Self::Inventory { .. } => "getInventory(string)",
            Self::CheckEligibility { .. } => "checkEligibility(address)",
        }
    }

    pub fn calldata(&self) -> Result<Vec<u8>, AbiError> {
        let args = match self {
            Self::Inventory { item } => vec![Token::String(item.clone())],
            Self::CheckEligibility { agent } => vec![Token::Address(agent.clone())],
            _ => Vec::new(),
        };
        abi::encode_call(self.signature(), &args)
    }

    pub fn decode(&self, data: &[u8]) -> Result<LedgerValue, AbiError> {
        Ok(match self {
            Self::InventoryItems => LedgerValue::Items(abi::decode_string_array(data)?),
            Self::Inventory { .. } => LedgerValue::Inventory(abi::decode_inventory(data)?),
            Self::CheckEligibility { .. } => {
                LedgerValue::Eligibility(abi::decode_eligibility(data)?)
            }
            _ => LedgerValue::Uint(abi::decode_uint(data)?),
        })
    }
}

// ---------------------------------------------------------------------------
// Write calls
// ---------------------------------------------------------------------------

/// A state-changing call. Amounts are in smallest units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteCall {
    RecordSale {
        item: String,
        quantity: u128,
        price: u128,
    },
    PaySupplier {
        supplier: String,
        amount: u128,
        item: String,
        quantity: u128,
    },
    RequestLoan {
        amount: u128,
    },
    CalculateScore {
        agent: String,
    },
}

impl WriteCall {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RecordSale { .. } => "recordSale",
            Self::PaySupplier { .. } => "paySupplier",
            Self::RequestLoan { .. } => "requestLoan",
            Self::CalculateScore { .. } => "calculateScore",
        }
    }

    pub fn contract(&self) -> Contract {
        match self {
            Self::RecordSale { .. } | Self::PaySupplier { .. } => Contract::Agent,
            Self::RequestLoan { .. } => Contract::Lending,
            Self::CalculateScore { .. } => Contract::Scoring,
        }
    }

    pub fn signature(&self) -> &'static str {
        match self {
            Self::RecordSale { .. } => "recordSale(string,uint256,uint256)",
            Self::PaySupplier { .. } => "paySupplier(address,uint256,string,uint256)",
            Self::RequestLoan { .. } => "requestLoan(uint256)",
            Self::CalculateScore { .. } => "calculateScore(address)",
        }
    }

    pub fn calldata(&self) -> Result<Vec<u8>, AbiError> {
        let args = match self {
            Self::RecordSale {
                item,
                quantity,
                price,
            } => vec![
                Token::String(item.clone()),
                Token::Uint(*quantity),
                Token::Uint(*price),
            ],
            Self::PaySupplier {
                supplier,
                amount,
                item,
                quantity,
            } => vec![
                Token::Address(supplier.clone()),
                Token::Uint(*amount),
                Token::String(item.clone()),
                Token::Uint(*quantity),
            ],
            Self::RequestLoan { amount } => vec![Token::Uint(*amount)],
            Self::CalculateScore { agent } => vec![Token::Address(agent.clone())],
        };
        abi::encode_call(self.signature(), &args)
    }
}

/// Outcome of a confirmed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    pub hash: String,
    pub block_number: Option<u128>,
    pub confirmed: bool,
}

/// The ledger as the rest of the crate sees it.
///
/// Reads are side-effect free and may be retried by the implementation;
/// writes are submitted at most once per call.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn call_read(&self, call: &ReadCall) -> Result<LedgerValue, GatewayError>;

    async fn call_write(&self, call: &WriteCall) -> Result<WriteReceipt, GatewayError>;
}

pub async fn read_uint(ledger: &dyn Ledger, call: ReadCall) -> Result<u128, GatewayError> {
    ledger.call_read(&call).await?.into_uint()
}

pub async fn read_items(ledger: &dyn Ledger) -> Result<Vec<String>, GatewayError> {
    ledger.call_read(&ReadCall::InventoryItems).await?.into_items()
}

pub async fn read_inventory(
    ledger: &dyn Ledger,
    item: &str,
) -> Result<InventoryRecord, GatewayError> {
    ledger
        .call_read(&ReadCall::Inventory {
            item: item.to_string(),
        })
        .await?
        .into_inventory()
}

pub async fn read_terms(ledger: &dyn Ledger, agent: &str) -> Result<LoanTerms, GatewayError> {
    ledger
        .call_read(&ReadCall::CheckEligibility {
            agent: agent.to_string(),
        })
        .await?
        .into_terms()
}
