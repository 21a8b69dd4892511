use fg_types::{Classify, ErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("failed to serialize/deserialize record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to join on blocking task: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl Classify for StoreError {
    fn kind(&self) -> ErrorKind {
        // Every variant here reflects either local corruption or a process
        // fault; both are unrecoverable for the record in question.
        ErrorKind::Unrecoverable
    }
}
