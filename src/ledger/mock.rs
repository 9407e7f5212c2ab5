//! In-memory ledger for unit tests.

use crate::ledger::{GatewayError, Ledger, LedgerValue, ReadCall, WriteCall, WriteReceipt};
use crate::types::{InventoryRecord, LoanTerms};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

/// Stable canned state plus a record of every call.
pub struct MockLedger {
    pub score: u128,
    pub revenue: u128,
    pub costs: u128,
    pub balance: u128,
    pub margin: u128,
    pub inventory: Vec<(String, u128)>,
    pub terms: LoanTerms,
    /// Read names (`ReadCall::name`) that fail with a network error.
    pub failing_reads: HashSet<&'static str>,
    pub write_error: Option<GatewayError>,
    pub reads: Mutex<Vec<ReadCall>>,
    pub writes: Mutex<Vec<WriteCall>>,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self {
            score: 640,
            revenue: 120 * 10u128.pow(18),
            costs: 80 * 10u128.pow(18),
            balance: 40 * 10u128.pow(18),
            margin: 33,
            inventory: vec![
                ("Tomatoes".into(), 45),
                ("Onions".into(), 12),
                ("Rice".into(), 30),
                ("Palm Oil".into(), 8),
            ],
            terms: LoanTerms {
                max_amount: 500 * 10u128.pow(18),
                interest_rate: 0,
                duration_seconds: 30 * 24 * 3600,
                eligible: true,
            },
            failing_reads: HashSet::new(),
            write_error: None,
            reads: Mutex::new(Vec::new()),
            writes: Mutex::new(Vec::new()),
        }
    }
}

impl MockLedger {
    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    pub fn read_count(&self) -> usize {
        self.reads.lock().unwrap().len()
    }

    pub fn last_write(&self) -> Option<WriteCall> {
        self.writes.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn call_read(&self, call: &ReadCall) -> Result<LedgerValue, GatewayError> {
        self.reads.lock().unwrap().push(call.clone());

        if self.failing_reads.contains(call.name()) {
            return Err(GatewayError::Network(format!("{} unreachable", call.name())));
        }

        Ok(match call {
            ReadCall::CreditScore => LedgerValue::Uint(self.score),
            ReadCall::TotalRevenue => LedgerValue::Uint(self.revenue),
            ReadCall::TotalCosts => LedgerValue::Uint(self.costs),
            ReadCall::Balance => LedgerValue::Uint(self.balance),
            ReadCall::ProfitMargin => LedgerValue::Uint(self.margin),
            ReadCall::InventoryItems => {
                LedgerValue::Items(self.inventory.iter().map(|(i, _)| i.clone()).collect())
            }
            ReadCall::Inventory { item } => {
                let quantity = self
                    .inventory
                    .iter()
                    .find(|(i, _)| i == item)
                    .map(|(_, q)| *q)
                    .unwrap_or(0);
                LedgerValue::Inventory(InventoryRecord {
                    item: item.clone(),
                    quantity,
                    cost_basis: 0,
                    last_updated: 0,
                })
            }
            ReadCall::CheckEligibility { .. } => LedgerValue::Eligibility(self.terms.clone()),
        })
    }

    async fn call_write(&self, call: &WriteCall) -> Result<WriteReceipt, GatewayError> {
        let mut writes = self.writes.lock().unwrap();
        writes.push(call.clone());

        match &self.write_error {
            Some(e) => Err(e.clone()),
            None => Ok(WriteReceipt {
                hash: format!("0x{:064x}", writes.len()),
                block_number: Some(1),
                confirmed: true,
            }),
        }
    }
}
