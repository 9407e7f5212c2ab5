//! Blockchain gateway: executes typed calls over JSON-RPC.
//!
//! Reads go through `eth_call` and are retried on transport failures.
//! Writes are signed locally, submitted exactly once, and awaited for one
//! confirmation under a hard bound. Submission is serialized through a
//! single-writer lock so concurrent callers (chat and the decision loop)
//! never race on the wallet nonce.

use crate::identity::Wallet;
use crate::ledger::abi;
use crate::ledger::rpc::{self, HttpTransport, RpcTransport};
use crate::ledger::tx::{self, LegacyTransaction};
use crate::ledger::{
    ContractAddresses, GatewayError, Ledger, LedgerValue, ReadCall, WriteCall, WriteReceipt,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Tunables for the gateway.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub chain_id: u64,
    /// Total attempts per read, including the first.
    pub read_attempts: u32,
    pub read_backoff: Duration,
    /// Upper bound on the wait for one confirmation.
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
    /// Headroom added on top of `eth_estimateGas`, in percent.
    pub gas_buffer_pct: u64,
}

/// A write between signing and confirmation.
///
/// Lives only inside one `call_write` invocation.
#[derive(Debug, Clone)]
pub struct PendingTransaction {
    pub call: WriteCall,
    pub submitted_at: DateTime<Utc>,
    pub hash: Option<String>,
    pub confirmations: u32,
}

impl PendingTransaction {
    fn new(call: WriteCall) -> Self {
        Self {
            call,
            submitted_at: Utc::now(),
            hash: None,
            confirmations: 0,
        }
    }

    fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.submitted_at).num_milliseconds()
    }
}

/// Gateway to the deployed contracts.
pub struct ChainGateway<T = HttpTransport> {
    transport: T,
    contracts: ContractAddresses,
    wallet: Wallet,
    settings: GatewaySettings,
    writer: Mutex<()>,
}

impl<T: RpcTransport> ChainGateway<T> {
    pub fn new(
        transport: T,
        contracts: ContractAddresses,
        wallet: Wallet,
        settings: GatewaySettings,
    ) -> Self {
        Self {
            transport,
            contracts,
            wallet,
            settings,
            writer: Mutex::new(()),
        }
    }

    /// Address writes are sent from.
    pub fn sender(&self) -> &str {
        &self.wallet.address
    }

    async fn eth_call(&self, call: &ReadCall) -> Result<LedgerValue, GatewayError> {
        let data = call.calldata()?;
        let to = self.contracts.address_of(call.contract());

        let result = self
            .transport
            .request(
                "eth_call",
                json!([
                    {
                        "from": &self.wallet.address,
                        "to": to,
                        "data": format!("0x{}", hex::encode(data)),
                    },
                    "latest"
                ]),
            )
            .await?;

        let bytes = rpc::parse_data(&result)?;
        Ok(call.decode(&bytes)?)
    }

    /// Sign and submit under the writer lock. Returns the transaction hash.
    async fn submit(&self, call: &WriteCall) -> Result<String, GatewayError> {
        let data = call.calldata()?;
        let to_address = self.contracts.address_of(call.contract());
        let to = abi::parse_address(to_address)?;
        let data_hex = format!("0x{}", hex::encode(&data));

        let _writer = self.writer.lock().await;

        let gas_price = rpc::parse_quantity(&self.transport.request("eth_gasPrice", json!([])).await?)?;

        let nonce = rpc::parse_quantity(
            &self
                .transport
                .request(
                    "eth_getTransactionCount",
                    json!([&self.wallet.address, "pending"]),
                )
                .await?,
        )?;

        // A revert here means the contract would refuse the call; nothing is sent.
        let estimate = rpc::parse_quantity(
            &self
                .transport
                .request(
                    "eth_estimateGas",
                    json!([{ "from": &self.wallet.address, "to": to_address, "data": &data_hex }]),
                )
                .await?,
        )?;

        let gas_limit = estimate
            .checked_mul(100 + self.settings.gas_buffer_pct as u128)
            .map(|g| g / 100)
            .and_then(|g| u64::try_from(g).ok())
            .ok_or_else(|| GatewayError::Malformed(format!("gas estimate out of range: {}", estimate)))?;

        let nonce = u64::try_from(nonce)
            .map_err(|_| GatewayError::Malformed(format!("nonce out of range: {}", nonce)))?;

        let transaction = LegacyTransaction {
            nonce,
            gas_price,
            gas_limit,
            to,
            value: 0,
            data,
            chain_id: self.settings.chain_id,
        };

        let raw = transaction
            .sign(&self.wallet)
            .map_err(|e| GatewayError::Rejected(format!("signing failed: {e}")))?;
        let local_hash = tx::transaction_hash(&raw);

        debug!(
            "Sending {} (nonce {}, gas {} @ {})",
            call.name(),
            nonce,
            gas_limit,
            gas_price
        );

        let result = self
            .transport
            .request(
                "eth_sendRawTransaction",
                json!([format!("0x{}", hex::encode(&raw))]),
            )
            .await?;

        Ok(result.as_str().map(str::to_string).unwrap_or(local_hash))
    }

    /// Poll for a receipt until one appears. Bounded by the caller.
    async fn wait_for_receipt(&self, hash: &str) -> Result<WriteReceipt, GatewayError> {
        loop {
            match self
                .transport
                .request("eth_getTransactionReceipt", json!([hash]))
                .await
            {
                Ok(Value::Null) => {}
                Ok(receipt) => return parse_receipt(hash, &receipt),
                Err(e) => warn!("Receipt poll for {} failed: {}", hash, e),
            }

            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }
}

fn parse_receipt(hash: &str, receipt: &Value) -> Result<WriteReceipt, GatewayError> {
    let status = match receipt.get("status").filter(|s| !s.is_null()) {
        Some(status) => Some(rpc::parse_quantity(status)?),
        None => None,
    };

    if status == Some(0) {
        return Err(GatewayError::Rejected(format!("transaction {} reverted", hash)));
    }

    let block_number = receipt
        .get("blockNumber")
        .and_then(|b| rpc::parse_quantity(b).ok());

    Ok(WriteReceipt {
        hash: hash.to_string(),
        block_number,
        confirmed: true,
    })
}

#[async_trait]
impl<T: RpcTransport> Ledger for ChainGateway<T> {
    async fn call_read(&self, call: &ReadCall) -> Result<LedgerValue, GatewayError> {
        let attempts = self.settings.read_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.eth_call(call).await {
                Err(GatewayError::Network(e)) if attempt < attempts => {
                    warn!(
                        "Read {} failed (attempt {}/{}): {}",
                        call.name(),
                        attempt,
                        attempts,
                        e
                    );
                    tokio::time::sleep(self.settings.read_backoff).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn call_write(&self, call: &WriteCall) -> Result<WriteReceipt, GatewayError> {
        let mut pending = PendingTransaction::new(call.clone());

        let hash = self.submit(call).await.inspect_err(|e| {
            warn!("Write {} not submitted ({}): {}", call.name(), e.kind(), e);
        })?;
        pending.hash = Some(hash.clone());
        info!("Submitted {} as {}", pending.call.name(), hash);

        match tokio::time::timeout(self.settings.confirmation_timeout, self.wait_for_receipt(&hash))
            .await
        {
            Ok(Ok(receipt)) => {
                pending.confirmations = 1;
                info!(
                    "Confirmed {} {} after {}ms (block {:?})",
                    pending.call.name(),
                    hash,
                    pending.elapsed_ms(),
                    receipt.block_number
                );
                Ok(receipt)
            }
            Ok(Err(e)) => {
                warn!("Write {} failed on-chain: {}", pending.call.name(), e);
                Err(e)
            }
            Err(_) => {
                warn!(
                    "No confirmation for {} within {:?}; outcome unknown until reconciled",
                    hash, self.settings.confirmation_timeout
                );
                Err(GatewayError::Timeout { hash })
            }
        }
    }
}
