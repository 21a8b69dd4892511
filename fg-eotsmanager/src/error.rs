use fg_types::{Classify, ErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum EotsError {
    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("bad passphrase")]
    BadPassphrase,

    #[error("double-sign attempt detected for fp={fp_pk} chain={chain_id} height={height}")]
    DoubleSignAttempt {
        fp_pk: String,
        chain_id: String,
        height: u64,
    },

    #[error("no randomness committed for fp={fp_pk} chain={chain_id} height={height}")]
    NoRandomnessCommitted {
        fp_pk: String,
        chain_id: String,
        height: u64,
    },

    #[error("secp256k1 error: {0}")]
    Secp256k1(#[from] secp256k1::Error),

    #[error("guard store error: {0}")]
    Store(#[from] redb::Error),

    #[error("guard database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("guard transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("guard table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("guard commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("guard storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("background task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Classify for EotsError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::DoubleSignAttempt { .. } => ErrorKind::Unrecoverable,
            Self::KeyNotFound(_) | Self::BadPassphrase => ErrorKind::Configuration,
            Self::NoRandomnessCommitted { .. } => ErrorKind::Expected,
            _ => ErrorKind::Unrecoverable,
        }
    }
}
