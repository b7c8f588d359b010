//! Error types for the activity log.

/// Errors that can occur during activity log operations.
#[derive(Debug, thiserror::Error)]
pub enum ActivityError {
    /// A database operation failed.
    #[error("activity database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// An event kind name was empty or whitespace.
    #[error("invalid activity kind name: {0:?}")]
    InvalidKind(String),
}
