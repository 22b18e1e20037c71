//! Error types for the snippet index

use thiserror::Error;

/// Errors surfaced by the search engine and the mode dispatcher.
///
/// A missing snippet or category is never an error: mutations on absent
/// names are no-ops, matching the store's query semantics.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Snippet store unavailable: {0:#}")]
    StoreUnavailable(#[from] anyhow::Error),
}

impl IndexError {
    pub fn invalid(message: impl Into<String>) -> Self {
        IndexError::InvalidArgument(message.into())
    }
}

/// Result type alias for index operations
pub type Result<T> = std::result::Result<T, IndexError>;
