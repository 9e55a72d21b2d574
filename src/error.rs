//! Error types for storage_manager

use thiserror::Error;

/// Unified error type for item store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row with the requested id in the category table
    #[error("Item {id} not found in {category}")]
    NotFound { category: String, id: String },
    /// A supplied field could not be interpreted (e.g. an unparsable price)
    #[error("Invalid input: {0}")]
    Validation(String),
    /// Table or image file could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed CSV table
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// Image decode or encode failed
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl StoreError {
    /// True for errors caused by the caller's input rather than storage
    pub fn is_client_error(&self) -> bool {
        matches!(self, StoreError::NotFound { .. } | StoreError::Validation(_))
    }
}

/// Result alias for item store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
