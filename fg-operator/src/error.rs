use fg_types::{Classify, ErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum OperatorError {
    #[error(transparent)]
    Eots(#[from] fg_eotsmanager::EotsError),

    #[error(transparent)]
    Store(#[from] fg_store::StoreError),

    #[error(transparent)]
    Consumer(#[from] fg_consumer::ConsumerError),

    #[error("max submission retries ({0}) exhausted")]
    RetriesExhausted(u32),

    #[error("finality provider {0} is jailed")]
    Jailed(fg_types::FpPubKey),
}

impl Classify for OperatorError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Eots(e) => e.kind(),
            Self::Store(e) => e.kind(),
            Self::Consumer(e) => e.kind(),
            Self::RetriesExhausted(_) => ErrorKind::Unrecoverable,
            Self::Jailed(_) => ErrorKind::Jailed,
        }
    }
}
