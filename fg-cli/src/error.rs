use std::path::PathBuf;

/// Startup and bootstrap failures. Per spec.md §6, any of these aborts with
/// a descriptive message and a nonzero exit code before any FP instance runs.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("could not determine the home directory; pass --home explicitly")]
    HomeDir,

    #[error("failed to load configuration from {path}: {source}")]
    ConfigLoad {
        path: PathBuf,
        #[source]
        source: config::ConfigError,
    },

    #[error("invalid hex-encoded finality provider pubkey: {0}")]
    InvalidFpPubKey(hex::FromHexError),

    #[error(transparent)]
    Eots(#[from] fg_eotsmanager::EotsError),

    #[error(transparent)]
    Store(#[from] fg_store::StoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Configuration(String),
}
