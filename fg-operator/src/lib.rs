//! FP Instance (C6) and FP Manager (C7): the two-loop state machine that
//! turns polled L2 blocks into committed randomness and submitted finality
//! votes, and the lifecycle manager that runs one instance per registered
//! finality provider.

pub mod config;
pub mod error;
pub mod instance;
pub mod manager;
pub mod metrics;

pub use config::FpInstanceConfig;
pub use error::OperatorError;
pub use instance::FpInstance;
pub use manager::FpManager;
pub use metrics::OperatorMetrics;

use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre;
use tokio::sync::mpsc;

use fg_consumer::ConsumerController;
use fg_eotsmanager::EotsManager;
use fg_store::{FpStore, PubRandStore};
use fg_types::{BlockInfo, FpPubKey};

/// Wires together one FP instance per `fp_pk`, registers it with `manager`,
/// and hands it `blocks` to consume. Thin orchestration glue over
/// `FpManager::register`, kept here so `fg-cli`'s binaries don't need to
/// construct `FpInstance` by hand.
#[allow(clippy::too_many_arguments)]
pub fn start_fp_instance(
    manager: &mut FpManager,
    fp_pk: FpPubKey,
    config: FpInstanceConfig,
    eots: Arc<EotsManager>,
    fp_store: FpStore,
    pubrand_store: PubRandStore,
    consumer: Arc<dyn ConsumerController>,
    metrics: OperatorMetrics,
    blocks: mpsc::Receiver<BlockInfo>,
) {
    let instance = Arc::new(FpInstance::new(
        fp_pk,
        config,
        eots,
        fp_store,
        pubrand_store,
        consumer,
        metrics,
        manager.critical_sender(),
    ));
    manager.register(fp_pk, instance, blocks);
}

/// Runs the manager loop until shutdown. Returns `Ok(None)` on a clean
/// shutdown or `Ok(Some(error))` when an FP instance raised an unrecoverable
/// critical error (spec.md §6: the caller should exit nonzero in that case).
pub async fn run_manager(manager: FpManager) -> eyre::Result<Option<fg_types::CriticalError>> {
    Ok(manager.run().await)
}

pub fn default_status_refresh_interval() -> Duration {
    Duration::from_secs(60)
}
