//! Configuration schema for marketmind.toml.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Log level (debug, info, warn, error) or a full EnvFilter directive.
    pub log_level: String,

    pub chain: ChainConfig,
    pub pricing: PricingConfig,
    pub advice: AdviceConfig,
    pub autonomy: AutonomyConfig,

    /// Supplier name → payable address.
    pub suppliers: BTreeMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            chain: ChainConfig::default(),
            pricing: PricingConfig::default(),
            advice: AdviceConfig::default(),
            autonomy: AutonomyConfig::default(),
            suppliers: BTreeMap::new(),
        }
    }
}

/// Ledger connection and deployed contracts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub chain_id: u64,

    /// Vendor's MarketMind agent contract (sales, payments, inventory).
    pub agent_address: String,
    pub lending_address: String,
    pub scoring_address: String,

    /// Hex secp256k1 key used to sign writes. Usually supplied through the
    /// environment rather than the file.
    pub private_key: String,

    pub rpc_timeout_secs: u64,
    pub read_attempts: u32,
    pub read_backoff_ms: u64,
    pub confirmation_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub gas_buffer_pct: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://forno.celo-sepolia.celo-testnet.org".into(),
            chain_id: 11_142_220,
            agent_address: "0x308597EB73a6bA43DBaA658aD6f9292dBf428284".into(),
            lending_address: "0xa688063f5f9A0B2635F64E56e5975b9C958b220a".into(),
            scoring_address: "0x3B272C51f41f85d50220EeE2b4420709af295588".into(),
            private_key: String::new(),
            rpc_timeout_secs: 15,
            read_attempts: 3,
            read_backoff_ms: 500,
            confirmation_timeout_secs: 60,
            poll_interval_ms: 1_000,
            gas_buffer_pct: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Naira per one unit of the base asset.
    pub naira_per_base_unit: u64,
    /// Quantity recorded for a supplier payment that names none.
    pub default_supply_quantity: u64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            naira_per_base_unit: 1500,
            default_supply_quantity: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdviceConfig {
    /// Margins at or above this percentage count as healthy.
    pub margin_threshold_pct: u64,
    /// Stock strictly below this triggers a low-stock alert.
    pub low_stock_threshold: u64,
}

impl Default for AdviceConfig {
    fn default() -> Self {
        Self {
            margin_threshold_pct: 20,
            low_stock_threshold: 20,
        }
    }
}

/// Autonomous decision loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutonomyConfig {
    pub enabled: bool,
    pub interval_secs: u64,

    /// Rolls below this restock an item.
    pub restock_below: f64,
    /// Rolls above this refresh the credit score.
    pub score_above: f64,

    pub restock_items: Vec<String>,
    /// Supplier name; must appear in `[suppliers]`.
    pub restock_supplier: String,
    /// Decimal amount in the base asset.
    pub restock_amount: String,
    pub restock_quantity: u64,

    /// Expected score gain from one refresh.
    pub score_step: u64,
    pub score_ceiling: u64,
}

impl Default for AutonomyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 10,
            restock_below: 0.3,
            score_above: 0.85,
            restock_items: vec![
                "Tomatoes".into(),
                "Onions".into(),
                "Rice".into(),
                "Palm Oil".into(),
            ],
            restock_supplier: String::new(),
            restock_amount: "0.001".into(),
            restock_quantity: 20,
            score_step: 2,
            score_ceiling: 850,
        }
    }
}
