/// Primary key of a user record.
pub type UserId = uuid::Uuid;

/// UTC timestamp as stored and serialized (RFC 3339).
pub type Timestamp = chrono::DateTime<chrono::Utc>;
