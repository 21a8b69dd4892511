use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use fg_types::RetryConfig;

use crate::error::CliError;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FpConfig {
    pub btc_pubkey_hex: String,
    pub address: String,
    #[serde(default)]
    pub passphrase: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FpTuningConfig {
    pub num_pub_rand: u64,
    pub min_rand_height_gap: u64,
    pub batch_submission_size: usize,
    #[serde(default)]
    pub finality_activation_height: u64,
    #[serde(with = "humantime_serde")]
    pub randomness_commit_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub signature_submission_interval: Duration,
    pub submission_retry: RetryConfig,
    pub power_cache_size: usize,
}

impl Default for FpTuningConfig {
    fn default() -> Self {
        let defaults = fg_operator::FpInstanceConfig::default();
        Self {
            num_pub_rand: defaults.num_pub_rand,
            min_rand_height_gap: defaults.min_rand_height_gap,
            batch_submission_size: defaults.batch_submission_size,
            finality_activation_height: defaults.finality_activation_height,
            randomness_commit_interval: defaults.randomness_commit_interval,
            signature_submission_interval: defaults.signature_submission_interval,
            submission_retry: defaults.submission_retry,
            power_cache_size: defaults.power_cache_size,
        }
    }
}

/// Root configuration for the `fg-node` daemon, per spec.md §6's list of
/// externally-configurable values (chain IDs, RPC URLs, DB paths, metrics
/// host/port, FP home path, FP BTC pubkey, FP address).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// Consumer chain ID as registered on the Babylon control chain.
    pub consumer_id: String,
    pub l2_rpc_url: Url,
    pub babylon_rest_url: Url,
    pub btc_oracle_url: Url,
    pub consumer_contract_addr: String,
    /// HTTP endpoint of the external transaction-signing sidecar.
    pub signer_url: Url,
    pub db_path: PathBuf,
    pub metrics_addr: SocketAddr,
    pub rpc_addr: SocketAddr,
    pub fp: FpConfig,
    #[serde(default)]
    pub fp_tuning: FpTuningConfig,
}

impl OperatorConfig {
    pub fn to_instance_config(&self) -> fg_operator::FpInstanceConfig {
        fg_operator::FpInstanceConfig {
            chain_id: self.consumer_id.clone(),
            passphrase: self.fp.passphrase.clone(),
            num_pub_rand: self.fp_tuning.num_pub_rand,
            min_rand_height_gap: self.fp_tuning.min_rand_height_gap,
            batch_submission_size: self.fp_tuning.batch_submission_size,
            finality_activation_height: self.fp_tuning.finality_activation_height,
            randomness_commit_interval: self.fp_tuning.randomness_commit_interval,
            signature_submission_interval: self.fp_tuning.signature_submission_interval,
            submission_retry: self.fp_tuning.submission_retry.clone(),
            power_cache_size: self.fp_tuning.power_cache_size,
        }
    }
}

/// Loads configuration from `path`, then overlays environment variables
/// prefixed `FG__` (double underscore separates nested keys), following the
/// teacher's `cli/src/config.rs::load_config` layering.
pub fn load_config(path: impl AsRef<Path>) -> Result<OperatorConfig, CliError> {
    let path = path.as_ref();
    ::config::Config::builder()
        .add_source(::config::File::from(path))
        .add_source(::config::Environment::with_prefix("FG").separator("__"))
        .build()
        .and_then(::config::Config::try_deserialize)
        .map_err(|source| CliError::ConfigLoad {
            path: path.to_path_buf(),
            source,
        })
}
