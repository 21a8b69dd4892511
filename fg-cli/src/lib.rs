//! Bootstraps the finality-gadget operator daemon: loads configuration,
//! opens the KV store and EOTS keystore, and wires the poller, FP instance,
//! resolver, and RPC front-end together.

pub mod args;
pub mod babylon;
pub mod bootstrap;
pub mod btc_oracle;
pub mod config;
pub mod error;
pub mod metrics_server;
pub mod tx_signer;

pub use args::Args;
pub use config::{load_config, OperatorConfig};
pub use error::CliError;

use std::path::Path;
use std::sync::Arc;

use color_eyre::eyre;
use prometheus::Registry;

use fg_consumer::{ConsumerController, CosmWasmController, GasMetrics};
use fg_eotsmanager::{DoubleSignGuard, EotsManager, FileKeyRing};
use fg_operator::{start_fp_instance, FpManager, OperatorMetrics};
use fg_poller::{ChainPoller, L2RpcClient, PollerConfig};
use fg_resolver::{CacheMetrics, FinalizationResolver};
use fg_store::{DbMetrics, FpStore, PubRandStore};
use fg_types::FpPubKey;

use crate::babylon::BabylonHttpQuery;
use crate::btc_oracle::HttpBtcOracle;
use crate::tx_signer::SidecarTxSigner;

/// Wires every component together and runs until a root cancellation signal
/// (SIGINT) arrives or an FP instance raises an unrecoverable critical
/// error. Returns the process exit code per spec.md §6: 0 on clean
/// shutdown, nonzero when a critical error aborted an FP instance.
pub async fn run(home: &Path, config: OperatorConfig) -> eyre::Result<i32> {
    let fp_pk = FpPubKey::from_hex(&config.fp.btc_pubkey_hex).map_err(CliError::InvalidFpPubKey)?;

    std::fs::create_dir_all(home).map_err(CliError::Io)?;
    let registry = Registry::new();

    let fp_store = FpStore::open(
        config.db_path.join("fp.redb"),
        DbMetrics::register(&registry, "fp"),
    )
    .map_err(CliError::Store)?;
    let pubrand_store = PubRandStore::open(
        config.db_path.join("pubrand.redb"),
        DbMetrics::register(&registry, "pubrand"),
    )
    .map_err(CliError::Store)?;

    let keyring = Arc::new(FileKeyRing::new(home.join("keyring")));
    let guard = DoubleSignGuard::open(home.join("doublesign.redb")).map_err(CliError::Eots)?;
    let eots = Arc::new(EotsManager::new(keyring, guard));

    let signer = Arc::new(SidecarTxSigner::new(config.signer_url.clone()));
    let consumer: Arc<dyn ConsumerController> = Arc::new(CosmWasmController::new(
        config.babylon_rest_url.clone(),
        config.consumer_contract_addr.clone(),
        signer,
        GasMetrics::register(&registry),
    ));

    let l2 = Arc::new(L2RpcClient::new(config.l2_rpc_url.clone()));
    let poller = ChainPoller::new(L2RpcClient::new(config.l2_rpc_url.clone()), PollerConfig::default());
    let blocks = poller.spawn();

    let operator_metrics = OperatorMetrics::register(&registry);
    let mut manager = FpManager::new(
        fp_store.clone(),
        consumer.clone(),
        operator_metrics.clone(),
        fg_operator::default_status_refresh_interval(),
    );
    start_fp_instance(
        &mut manager,
        fp_pk,
        config.to_instance_config(),
        eots,
        fp_store,
        pubrand_store,
        consumer.clone(),
        operator_metrics,
        blocks,
    );

    let babylon = Arc::new(BabylonHttpQuery::new(config.babylon_rest_url.clone()));
    let btc_oracle = Arc::new(HttpBtcOracle::new(config.btc_oracle_url.clone()));
    let resolver = Arc::new(FinalizationResolver::new(
        consumer,
        babylon,
        btc_oracle,
        l2.clone(),
        config.consumer_id.clone(),
        CacheMetrics::register(&registry),
        0,
    ));
    let refresher = resolver.clone().spawn_all_fp_pks_refresher();

    let rpc_handle = fg_rpc::serve(config.rpc_addr, l2, resolver).await?;
    let metrics_handle = metrics_server::spawn(config.metrics_addr, registry.clone())
        .await
        .map_err(CliError::Io)?;

    let critical = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received shutdown signal");
            None
        }
        critical = fg_operator::run_manager(manager) => critical?,
    };

    refresher.abort();
    metrics_handle.abort();
    rpc_handle.stop().ok();
    rpc_handle.stopped().await;

    match critical {
        Some(error) => {
            tracing::error!(%error, "exiting after unrecoverable finality provider error");
            Ok(1)
        }
        None => Ok(0),
    }
}
