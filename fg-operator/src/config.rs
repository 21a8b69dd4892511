use std::time::Duration;

use fg_types::RetryConfig;

/// Per-FP instance tuning knobs, per spec.md §4.1's enumerated configuration.
#[derive(Clone, Debug)]
pub struct FpInstanceConfig {
    pub chain_id: String,
    pub passphrase: String,
    /// Leaves per commitment window (typical 1-10k).
    pub num_pub_rand: u64,
    /// Safety margin between the randomness horizon and the chain tip.
    pub min_rand_height_gap: u64,
    /// Max blocks per vote batch.
    pub batch_submission_size: usize,
    /// Height below which no votes are cast even if the FP has power.
    pub finality_activation_height: u64,
    pub randomness_commit_interval: Duration,
    pub signature_submission_interval: Duration,
    pub submission_retry: RetryConfig,
    /// Size of the per-height "has power" cache.
    pub power_cache_size: usize,
}

impl Default for FpInstanceConfig {
    fn default() -> Self {
        Self {
            chain_id: "rollup-1".to_string(),
            passphrase: String::new(),
            num_pub_rand: 1,
            min_rand_height_gap: 10,
            batch_submission_size: 50,
            finality_activation_height: 0,
            randomness_commit_interval: Duration::from_secs(30),
            signature_submission_interval: Duration::from_secs(1),
            submission_retry: RetryConfig::default(),
            power_cache_size: 4096,
        }
    }
}
