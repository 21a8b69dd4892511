use fg_types::{Classify, ErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum ConsumerError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("contract returned an error: {0}")]
    Contract(String),

    #[error("duplicate submission rejected by contract: {0}")]
    Duplicate(String),

    #[error("submission target already finalized")]
    AlreadyFinalized,

    #[error("submission height too old")]
    TooOld,

    #[error("finality provider is jailed")]
    Jailed,

    #[error("invalid signature rejected by contract")]
    InvalidSignature,

    #[error("response failed to decode: {0}")]
    Decode(String),

    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl Classify for ConsumerError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSignature => ErrorKind::Unrecoverable,
            Self::Jailed => ErrorKind::Jailed,
            Self::Duplicate(_) | Self::AlreadyFinalized | Self::TooOld => ErrorKind::Expected,
            Self::Transport(_) | Self::Timeout(_) => ErrorKind::Retryable,
            Self::Contract(_) | Self::Decode(_) => ErrorKind::Retryable,
        }
    }
}
