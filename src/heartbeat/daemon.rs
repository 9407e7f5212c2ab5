//! Autonomous decision loop.
//!
//! Wakes on a fixed interval, rolls once, and when the roll says so pushes a
//! synthesized intent through the same router a vendor message would use.
//! The loop never talks to the ledger gateway directly.

use crate::actions::ActionRouter;
use crate::config::AutonomyConfig;
use crate::heartbeat::rules::{self, Decision};
use crate::ledger::GatewayError;
use crate::state::BusinessStateAggregator;
use crate::types::{ActionResult, Currency, Field, Intent, IntentKind};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    /// Score refresh skipped; it would pass the ceiling.
    AtCeiling { score: u128 },
    Acted {
        kind: IntentKind,
        result: ActionResult,
    },
    /// The state needed to decide could not be read.
    Unavailable(GatewayError),
}

impl TickOutcome {
    pub fn is_failure(&self) -> bool {
        match self {
            Self::Unavailable(_) => true,
            Self::Acted { result, .. } => !result.is_success(),
            Self::Idle | Self::AtCeiling { .. } => false,
        }
    }
}

pub struct DecisionLoop {
    router: Arc<ActionRouter>,
    aggregator: Arc<BusinessStateAggregator>,
    config: AutonomyConfig,
    rng: StdRng,
    consecutive_failures: u32,
}

impl DecisionLoop {
    pub fn new(
        router: Arc<ActionRouter>,
        aggregator: Arc<BusinessStateAggregator>,
        config: AutonomyConfig,
    ) -> Self {
        Self::with_rng(router, aggregator, config, StdRng::from_entropy())
    }

    pub fn with_rng(
        router: Arc<ActionRouter>,
        aggregator: Arc<BusinessStateAggregator>,
        config: AutonomyConfig,
        rng: StdRng,
    ) -> Self {
        Self {
            router,
            aggregator,
            config,
            rng,
            consecutive_failures: 0,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Run until `cancel` fires. A failing tick is logged and the next one
    /// runs on schedule; there is no backoff.
    pub async fn run(&mut self, cancel: CancellationToken) {
        let interval = Duration::from_secs(self.config.interval_secs);
        info!(interval_secs = self.config.interval_secs, "Decision loop started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    self.tick().await;
                }
                _ = cancel.cancelled() => {
                    info!("Decision loop shutting down");
                    return;
                }
            }
        }
    }

    /// Roll once and act on the result.
    pub async fn tick(&mut self) -> TickOutcome {
        let roll: f64 = self.rng.gen();
        let decision = rules::decide(roll, self.config.restock_below, self.config.score_above);
        debug!(roll, ?decision, "Decision loop tick");

        let outcome = match decision {
            Decision::Idle => TickOutcome::Idle,
            Decision::Restock => self.restock().await,
            Decision::RefreshScore => self.refresh_score().await,
        };

        if outcome.is_failure() {
            self.consecutive_failures += 1;
            warn!(
                consecutive = self.consecutive_failures,
                "Autonomous action failed: {:?}", outcome
            );
        } else {
            self.consecutive_failures = 0;
        }

        outcome
    }

    async fn restock(&mut self) -> TickOutcome {
        let Some(item) = self.config.restock_items.choose(&mut self.rng).cloned() else {
            return TickOutcome::Idle;
        };

        let intent = Intent::synthesized(
            IntentKind::PaySupplier,
            [
                (Field::Supplier, self.config.restock_supplier.clone()),
                (Field::Amount, self.config.restock_amount.clone()),
                (Field::Currency, Currency::Cusd.as_token().to_string()),
                (Field::Item, item.clone()),
                (Field::Quantity, self.config.restock_quantity.to_string()),
            ],
        );

        info!(item = %item, "Autonomous restock");
        let result = self.router.route(&intent).await;
        TickOutcome::Acted {
            kind: IntentKind::PaySupplier,
            result,
        }
    }

    async fn refresh_score(&mut self) -> TickOutcome {
        let snapshot = match self.aggregator.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => return TickOutcome::Unavailable(e),
        };

        let step = u128::from(self.config.score_step);
        let ceiling = u128::from(self.config.score_ceiling);
        if !rules::within_ceiling(snapshot.credit_score, step, ceiling) {
            debug!(score = %snapshot.credit_score, "Score refresh skipped at ceiling");
            return TickOutcome::AtCeiling {
                score: snapshot.credit_score,
            };
        }

        info!(score = %snapshot.credit_score, "Autonomous score refresh");
        let intent = Intent::synthesized(IntentKind::UpdateScore, Vec::<(Field, String)>::new());
        let result = self.router.route(&intent).await;
        TickOutcome::Acted {
            kind: IntentKind::UpdateScore,
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::units::UNIT;
    use crate::actions::RouterSettings;
    use crate::ledger::mock::MockLedger;
    use crate::ledger::WriteCall;
    use crate::registry::StaticDirectory;

    const BALA: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79ee";

    fn config(restock_below: f64, score_above: f64) -> AutonomyConfig {
        AutonomyConfig {
            enabled: true,
            restock_below,
            score_above,
            restock_supplier: "Bala".into(),
            ..AutonomyConfig::default()
        }
    }

    fn decision_loop(ledger: Arc<MockLedger>, config: AutonomyConfig) -> DecisionLoop {
        let router = ActionRouter::new(
            ledger.clone(),
            Arc::new(StaticDirectory::new([("Bala", BALA)])),
            RouterSettings {
                agent_address: "0x308597EB73a6bA43DBaA658aD6f9292dBf428284".into(),
                ..RouterSettings::default()
            },
        );
        DecisionLoop::with_rng(
            Arc::new(router),
            Arc::new(BusinessStateAggregator::new(ledger)),
            config,
            StdRng::seed_from_u64(7),
        )
    }

    #[tokio::test]
    async fn restock_pays_supplier_through_router() {
        let ledger = Arc::new(MockLedger::default());
        let mut lp = decision_loop(ledger.clone(), config(1.0, 1.0));

        let outcome = lp.tick().await;
        assert!(matches!(outcome, TickOutcome::Acted { kind: IntentKind::PaySupplier, ref result } if result.is_success()));

        match ledger.last_write() {
            Some(WriteCall::PaySupplier {
                supplier,
                amount,
                item,
                quantity,
            }) => {
                assert_eq!(supplier, BALA);
                assert_eq!(amount, UNIT / 1000);
                assert_eq!(quantity, 20);
                assert!(AutonomyConfig::default().restock_items.contains(&item));
            }
            other => panic!("unexpected write: {:?}", other),
        }
    }

    #[tokio::test]
    async fn middle_band_does_nothing() {
        let ledger = Arc::new(MockLedger::default());
        let mut lp = decision_loop(ledger.clone(), config(0.0, 1.0));

        for _ in 0..5 {
            assert_eq!(lp.tick().await, TickOutcome::Idle);
        }
        assert_eq!(ledger.read_count() + ledger.write_count(), 0);
    }

    #[tokio::test]
    async fn score_refresh_respects_ceiling() {
        let mut mock = MockLedger::default();
        mock.score = 849;
        let ledger = Arc::new(mock);
        let mut lp = decision_loop(ledger.clone(), config(0.0, 0.0));

        assert_eq!(lp.tick().await, TickOutcome::AtCeiling { score: 849 });
        assert_eq!(ledger.write_count(), 0);
    }

    #[tokio::test]
    async fn score_refresh_below_ceiling_writes() {
        let ledger = Arc::new(MockLedger::default());
        let mut lp = decision_loop(ledger.clone(), config(0.0, 0.0));

        let outcome = lp.tick().await;
        assert!(!outcome.is_failure());
        assert!(matches!(
            ledger.last_write(),
            Some(WriteCall::CalculateScore { .. })
        ));
    }

    #[tokio::test]
    async fn failures_are_counted_not_fatal() {
        let mut mock = MockLedger::default();
        mock.write_error = Some(GatewayError::Network("connection refused".into()));
        let ledger = Arc::new(mock);
        let mut lp = decision_loop(ledger.clone(), config(1.0, 1.0));

        assert!(lp.tick().await.is_failure());
        assert!(lp.tick().await.is_failure());
        assert_eq!(lp.consecutive_failures(), 2);
        assert_eq!(ledger.write_count(), 2);
    }

    #[tokio::test]
    async fn unavailable_snapshot_is_a_failure() {
        let mut mock = MockLedger::default();
        mock.failing_reads.insert("creditScore");
        let ledger = Arc::new(mock);
        let mut lp = decision_loop(ledger.clone(), config(0.0, 0.0));

        assert!(matches!(lp.tick().await, TickOutcome::Unavailable(_)));
        assert_eq!(lp.consecutive_failures(), 1);
        assert_eq!(ledger.write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn run_ticks_on_interval_until_cancelled() {
        let ledger = Arc::new(MockLedger::default());
        let mut lp = decision_loop(ledger.clone(), config(1.0, 1.0));
        let cancel = CancellationToken::new();

        let handle = tokio::spawn({
            let cancel = cancel.clone();
            async move { lp.run(cancel).await }
        });

        tokio::time::sleep(Duration::from_secs(35)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(ledger.write_count(), 3);
    }
}
