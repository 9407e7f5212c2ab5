pub mod schema;

pub use schema::{AdviceConfig, AppConfig, AutonomyConfig, ChainConfig, PricingConfig};

use crate::actions::units::parse_units;
use crate::actions::RouterSettings;
use crate::ledger::abi::parse_address;
use crate::ledger::{ContractAddresses, GatewaySettings};
use crate::registry::StaticDirectory;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Default MarketMind home directory (~/.marketmind).
pub fn default_home_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().join(".marketmind"))
        .unwrap_or_else(|| PathBuf::from(".marketmind"))
}

/// Default config file path.
pub fn default_config_path() -> PathBuf {
    default_home_dir().join("marketmind.toml")
}

/// Load config from the given path, or return defaults.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        let contents =
            std::fs::read_to_string(path).context("Failed to read marketmind config file")?;
        let config: AppConfig =
            toml::from_str(&contents).context("Failed to parse marketmind config (TOML)")?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    } else {
        debug!("No config at {}, using defaults", path.display());
        Ok(AppConfig::default())
    }
}

/// Resolve a path that may contain `~`.
pub fn resolve_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

impl AppConfig {
    /// Overlay process environment variables. Called once at startup.
    pub fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from `lookup`; empty values are ignored.
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("CELO_RPC_URL") {
            self.chain.rpc_url = v;
        }
        if let Some(v) = get("MARKETMIND_AGENT_ADDRESS") {
            self.chain.agent_address = v;
        }
        if let Some(v) = get("MICRO_LENDING_ADDRESS") {
            self.chain.lending_address = v;
        }
        if let Some(v) = get("CREDIT_SCORING_ADDRESS") {
            self.chain.scoring_address = v;
        }
        if let Some(v) = get("DEPLOYER_PRIVATE_KEY") {
            self.chain.private_key = v;
        }
        if let Some(v) = get("MARKETMIND_LOG") {
            self.log_level = v;
        }
    }

    /// Check everything needed to talk to the ledger. All problems are
    /// reported at once.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.chain.rpc_url.trim().is_empty() {
            problems.push("chain.rpc_url is empty".to_string());
        }
        if self.chain.private_key.trim().is_empty() {
            problems.push(
                "chain.private_key is empty (set DEPLOYER_PRIVATE_KEY or the config value)"
                    .to_string(),
            );
        }
        for (name, address) in [
            ("chain.agent_address", &self.chain.agent_address),
            ("chain.lending_address", &self.chain.lending_address),
            ("chain.scoring_address", &self.chain.scoring_address),
        ] {
            if let Err(e) = parse_address(address) {
                problems.push(format!("{} '{}': {}", name, address, e));
            }
        }
        if self.chain.read_attempts == 0 {
            problems.push("chain.read_attempts must be at least 1".to_string());
        }
        if self.chain.poll_interval_ms == 0 {
            problems.push("chain.poll_interval_ms must be positive".to_string());
        }
        if self.pricing.naira_per_base_unit == 0 {
            problems.push("pricing.naira_per_base_unit must be positive".to_string());
        }
        for (name, address) in &self.suppliers {
            if let Err(e) = parse_address(address) {
                problems.push(format!("suppliers.{} '{}': {}", name, address, e));
            }
        }

        if self.autonomy.enabled {
            problems.extend(self.autonomy_problems());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            bail!("Invalid configuration:\n  - {}", problems.join("\n  - "))
        }
    }

    fn autonomy_problems(&self) -> Vec<String> {
        let a = &self.autonomy;
        let mut problems = Vec::new();

        if a.interval_secs == 0 {
            problems.push("autonomy.interval_secs must be positive".to_string());
        }
        if !(0.0..=1.0).contains(&a.restock_below)
            || !(0.0..=1.0).contains(&a.score_above)
            || a.restock_below > a.score_above
        {
            problems.push(
                "autonomy thresholds must satisfy 0 <= restock_below <= score_above <= 1"
                    .to_string(),
            );
        }
        if a.restock_items.is_empty() {
            problems.push("autonomy.restock_items is empty".to_string());
        }
        if parse_units(&a.restock_amount).is_none() {
            problems.push(format!(
                "autonomy.restock_amount '{}' is not a decimal amount",
                a.restock_amount
            ));
        }
        let known_supplier = self
            .suppliers
            .keys()
            .any(|name| name.eq_ignore_ascii_case(&a.restock_supplier));
        if !known_supplier {
            problems.push(format!(
                "autonomy.restock_supplier '{}' is not listed under [suppliers]",
                a.restock_supplier
            ));
        }

        problems
    }

    pub fn contract_addresses(&self) -> ContractAddresses {
        ContractAddresses {
            agent: self.chain.agent_address.clone(),
            lending: self.chain.lending_address.clone(),
            scoring: self.chain.scoring_address.clone(),
        }
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.chain.rpc_timeout_secs)
    }

    pub fn gateway_settings(&self) -> GatewaySettings {
        GatewaySettings {
            chain_id: self.chain.chain_id,
            read_attempts: self.chain.read_attempts,
            read_backoff: Duration::from_millis(self.chain.read_backoff_ms),
            confirmation_timeout: Duration::from_secs(self.chain.confirmation_timeout_secs),
            poll_interval: Duration::from_millis(self.chain.poll_interval_ms),
            gas_buffer_pct: self.chain.gas_buffer_pct,
        }
    }

    pub fn router_settings(&self) -> RouterSettings {
        RouterSettings {
            agent_address: self.chain.agent_address.clone(),
            naira_per_base_unit: u128::from(self.pricing.naira_per_base_unit),
            default_supply_quantity: u128::from(self.pricing.default_supply_quantity),
            margin_threshold_pct: u128::from(self.advice.margin_threshold_pct),
            low_stock_threshold: u128::from(self.advice.low_stock_threshold),
        }
    }

    pub fn supplier_directory(&self) -> StaticDirectory {
        StaticDirectory::new(&self.suppliers)
    }
}
