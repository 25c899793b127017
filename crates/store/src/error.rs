#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] redb::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("request {0} is indexed but has no stored row")]
    MissingRequest(crate::RequestId),
}

/// Convert any of the redb error kinds into a [`StoreError`].
pub(crate) fn db<E>(error: E) -> StoreError
where
    E: Into<redb::Error>,
{
    StoreError::Database(error.into())
}
