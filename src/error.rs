//! Error types for the wxcat metadata catalog.

use crate::types::{ProductId, ProductTypeId};
use std::path::PathBuf;
use thiserror::Error;

/// Catalog-level errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Unknown product: {0}")]
    UnknownProduct(ProductId),

    #[error("Unknown product type: {0}")]
    UnknownProductType(ProductTypeId),

    #[error("Invalid timestamp: {0}")]
    InvalidStamp(String),

    #[error("Malformed document at {path:?}: {source}")]
    MalformedDocument {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize document for {path:?}: {source}")]
    SerializeFailed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Run lock at {0:?} held past deadline")]
    LockHeld(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
