use fg_types::{Classify, ErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum PollerError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("response failed to decode: {0}")]
    Decode(String),

    #[error("channel closed, no consumer left")]
    ChannelClosed,
}

impl Classify for PollerError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) | Self::Rpc { .. } => ErrorKind::Retryable,
            Self::Decode(_) => ErrorKind::Unrecoverable,
            Self::ChannelClosed => ErrorKind::Unrecoverable,
        }
    }
}
