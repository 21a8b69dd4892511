use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use fg_consumer::ConsumerController;
use fg_store::FpStore;
use fg_types::{BlockInfo, CriticalError, FpPubKey};

use crate::instance::FpInstance;
use crate::metrics::OperatorMetrics;

/// Lifecycle of N FP Instances (C7): dispatches critical errors raised by any
/// instance and periodically refreshes per-FP status against on-chain power,
/// per spec.md §4.1.4 and §4's component table.
///
/// The Consumer Controller trait (C5) exposes per-height voting power but not
/// a dedicated jailed/slashed query; jailed/slashed transitions are instead
/// observed indirectly, via `ConsumerError::Jailed` surfaced from a
/// submission attempt and escalated as a critical error by the instance
/// itself. The periodic refresh here only drives the ACTIVE/INACTIVE split.
pub struct FpManager {
    fp_store: FpStore,
    consumer: Arc<dyn ConsumerController>,
    metrics: OperatorMetrics,
    status_refresh_interval: Duration,
    critical_rx: mpsc::Receiver<CriticalError>,
    critical_tx: mpsc::Sender<CriticalError>,
    instances: HashMap<FpPubKey, Arc<FpInstance>>,
}

impl FpManager {
    pub fn new(fp_store: FpStore, consumer: Arc<dyn ConsumerController>, metrics: OperatorMetrics, status_refresh_interval: Duration) -> Self {
        let (critical_tx, critical_rx) = mpsc::channel(256);
        Self {
            fp_store,
            consumer,
            metrics,
            status_refresh_interval,
            critical_rx,
            critical_tx,
            instances: HashMap::new(),
        }
    }

    pub fn critical_sender(&self) -> mpsc::Sender<CriticalError> {
        self.critical_tx.clone()
    }

    /// Register and spawn a new FP instance's loops, fed by `blocks`.
    pub fn register(&mut self, fp_pk: FpPubKey, instance: Arc<FpInstance>, blocks: mpsc::Receiver<BlockInfo>) {
        instance.clone().spawn(blocks);
        self.instances.insert(fp_pk, instance);
    }

    /// Runs the manager loop: drains critical errors and periodically
    /// refreshes status for every registered FP.
    ///
    /// Returns `None` on a clean shutdown (the critical channel closed
    /// because every instance and its sender was dropped), or `Some(error)`
    /// for the first critical error received — per spec.md §7, an
    /// unrecoverable error aborts the FP instance and "the manager logs and
    /// may abort the process"; this manager does the latter.
    pub async fn run(mut self) -> Option<CriticalError> {
        let mut ticker = tokio::time::interval(self.status_refresh_interval);
        loop {
            tokio::select! {
                maybe_error = self.critical_rx.recv() => {
                    match maybe_error {
                        Some(error) => {
                            self.handle_critical(&error).await;
                            return Some(error);
                        }
                        None => return None,
                    }
                }
                _ = ticker.tick() => {
                    self.refresh_all_statuses().await;
                }
            }
        }
    }

    async fn handle_critical(&self, error: &CriticalError) {
        tracing::error!(fp_pk = %error.fp_pk, message = %error.message, "critical error from finality provider instance");
    }

    async fn refresh_all_statuses(&self) {
        let eligible = match self.fp_store.all().await {
            Ok(fps) => fps,
            Err(error) => {
                tracing::warn!(%error, "status refresh failed to list finality providers");
                return;
            }
        };

        for mut fp in eligible {
            if fp.status == fg_types::FpStatus::Slashed {
                continue;
            }
            let tip_height = fp.last_voted_height;
            let has_power = match self.consumer.query_fp_has_power(fp.fp_pk, tip_height).await {
                Ok(has_power) => has_power,
                Err(error) => {
                    tracing::debug!(fp_pk = %fp.fp_pk, %error, "status refresh power query failed, skipping");
                    continue;
                }
            };
            let voting_power = u64::from(has_power);
            let next = fp.status.next(voting_power, fp.status == fg_types::FpStatus::Jailed, false);
            if next != fp.status {
                fp.status = next;
                self.metrics.set_status(&fp.fp_pk.to_hex(), fp.status);
                if let Err(error) = self.fp_store.put(fp).await {
                    tracing::warn!(%error, "failed to persist refreshed status");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fg_consumer::mock::MockConsumerController;
    use fg_types::{FinalityProvider, FpStatus};

    #[tokio::test]
    async fn status_refresh_activates_fp_with_power() {
        let fp_store = FpStore::in_memory();
        let fp_pk = FpPubKey([1u8; 32]);
        fp_store.put(FinalityProvider::new(fp_pk, "chain-1", "bbn1abc")).await.unwrap();

        let consumer = MockConsumerController::new();
        consumer.set_power(fp_pk, 0, true);
        let consumer: Arc<dyn ConsumerController> = Arc::new(consumer);

        let manager = FpManager::new(fp_store.clone(), consumer, OperatorMetrics::noop(), Duration::from_secs(1));
        manager.refresh_all_statuses().await;

        let fp = fp_store.get(fp_pk).await.unwrap().unwrap();
        assert_eq!(fp.status, FpStatus::Active);
    }

    #[tokio::test]
    async fn slashed_fp_is_never_refreshed() {
        let fp_store = FpStore::in_memory();
        let fp_pk = FpPubKey([1u8; 32]);
        let mut fp = FinalityProvider::new(fp_pk, "chain-1", "bbn1abc");
        fp.status = FpStatus::Slashed;
        fp_store.put(fp).await.unwrap();

        let consumer = MockConsumerController::new();
        consumer.set_power(fp_pk, 0, true);
        let consumer: Arc<dyn ConsumerController> = Arc::new(consumer);

        let manager = FpManager::new(fp_store.clone(), consumer, OperatorMetrics::noop(), Duration::from_secs(1));
        manager.refresh_all_statuses().await;

        let fp = fp_store.get(fp_pk).await.unwrap().unwrap();
        assert_eq!(fp.status, FpStatus::Slashed);
    }
}
