use fg_types::{Classify, ErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error(transparent)]
    Consumer(#[from] fg_consumer::ConsumerError),

    #[error("btc oracle error: {0}")]
    BtcOracle(String),

    #[error("babylon chain query error: {0}")]
    BabylonQuery(String),

    #[error("upstream L2 RPC error: {0}")]
    L2Rpc(#[from] fg_poller::PollerError),
}

impl Classify for ResolverError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Consumer(e) => e.kind(),
            Self::L2Rpc(e) => e.kind(),
            Self::BtcOracle(_) | Self::BabylonQuery(_) => ErrorKind::Retryable,
        }
    }
}
