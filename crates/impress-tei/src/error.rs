//! Error types for impress-tei

use std::path::PathBuf;

use quick_xml::events::attributes::AttrError;
use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for sync runs
pub type Result<T> = std::result::Result<T, SyncError>;

/// Top-level error for a reconciliation run
#[derive(Error, Debug)]
pub enum SyncError {
    /// The bibliography export could not be read
    #[error("Failed to read JSON file '{}': {source}", .path.display())]
    Source { path: PathBuf, source: SourceError },

    /// The TEI document could not be read or parsed
    #[error("Failed to parse XML file '{}': {source}", .path.display())]
    Target { path: PathBuf, source: TeiError },

    /// The updated TEI document could not be written back
    #[error("Failed to write updated XML '{}': {source}", .path.display())]
    Write { path: PathBuf, source: TeiError },

    /// An item key matched several biblStruct entries under the unique policy
    #[error("Item key '{item_key}' matches {count} biblStruct entries")]
    Ambiguous { item_key: String, count: usize },

    /// Invalid run configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors loading CSL-JSON records
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Top-level value was not an array
    #[error("Expected a JSON array of records, found {0}")]
    NotAnArray(&'static str),
}

/// Errors reading or writing TEI documents
#[derive(Error, Debug)]
pub enum TeiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid attribute: {0}")]
    Attribute(#[from] AttrError),

    #[error("Invalid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// Document has no root element
    #[error("Document has no root element")]
    NoRoot,

    /// Elements left open at end of input, or content after the root
    #[error("Malformed document structure: {0}")]
    Unbalanced(String),
}
