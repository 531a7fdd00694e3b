use std::time::Duration;

/// Failures of the session store or the user database.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing service could not be reached or rejected the command.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    /// A stored value could not be decoded.
    #[error("Corrupt record at {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// A uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}
