//! Error types for the wellness_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for wellness_core operations
///
/// Every variant renders as a short human-readable message; callers show it
/// to the user as-is and never retry.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A document key that does not exist (or belongs to another user)
    #[error("No {collection} record with id '{id}'")]
    NotFound { collection: String, id: String },

    /// Authentication failure (bad credentials, duplicate account, ...)
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Operation requires a signed-in user
    #[error("Not signed in")]
    NotSignedIn,

    /// Invalid user input rejected before reaching the store
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Document store failure (malformed document, persistence failure)
    #[error("Store error: {0}")]
    Store(String),

    /// A routine must contain at least one exercise
    #[error("Routine has no exercises")]
    EmptyRoutine,
}

impl Error {
    pub(crate) fn not_found(collection: &str, id: &str) -> Self {
        Error::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}
