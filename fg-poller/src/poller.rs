use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use fg_types::BlockInfo;

use crate::error::PollerError;
use crate::rpc::L2RpcClient;

/// Poll cadence and starting point for the chain poller (C4), per spec.md
/// §4.1's `poller_*` configuration group.
#[derive(Clone, Debug)]
pub struct PollerConfig {
    pub poll_interval: Duration,
    pub batch_size: u64,
    /// Height to resume from; `None` starts from the chain tip.
    pub start_height: Option<u64>,
    pub channel_capacity: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            batch_size: 50,
            start_height: None,
            channel_capacity: 1024,
        }
    }
}

/// Single-producer source of `BlockInfo`, strictly monotone in height.
pub struct ChainPoller {
    rpc: L2RpcClient,
    config: PollerConfig,
}

impl ChainPoller {
    pub fn new(rpc: L2RpcClient, config: PollerConfig) -> Self {
        Self { rpc, config }
    }

    /// Spawns the polling task and returns the receiving end of its channel.
    /// The task runs until the receiver is dropped or an unrecoverable error
    /// occurs, at which point it logs and exits.
    pub fn spawn(self) -> mpsc::Receiver<BlockInfo> {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        tokio::spawn(async move {
            if let Err(error) = self.run(tx).await {
                tracing::error!(?error, "chain poller task exiting");
            }
        });
        rx
    }

    async fn run(self, tx: mpsc::Sender<BlockInfo>) -> Result<(), PollerError> {
        let mut next_height = match self.config.start_height {
            Some(h) => h,
            None => self.rpc.block_number().await?,
        };

        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let tip = match self.rpc.block_number().await {
                Ok(tip) => tip,
                Err(error) => {
                    tracing::warn!(?error, "poll tick failed to fetch chain tip, retrying");
                    continue;
                }
            };

            if next_height > tip {
                continue;
            }

            let batch_end = tip.min(next_height + self.config.batch_size - 1);
            for height in next_height..=batch_end {
                let block = match self.rpc.get_block_by_number(height, None).await {
                    Ok(block) => block,
                    Err(error) => {
                        tracing::warn!(?error, height, "failed to fetch block, will retry next tick");
                        break;
                    }
                };

                if tx.send(block).await.is_err() {
                    return Err(PollerError::ChannelClosed);
                }
                next_height = height + 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_batch_size() {
        let config = PollerConfig::default();
        assert!(config.batch_size > 0);
        assert!(config.poll_interval > Duration::ZERO);
    }
}
