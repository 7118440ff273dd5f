//! Error types for document edits and file loading.

use thiserror::Error;

/// A rejected edit. The document is left untouched whenever one is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Name is empty")]
    EmptyName,
    #[error("Name {0:?} uses the reserved prefix")]
    ReservedName(String),
    #[error("Duplicate entry: {0}")]
    Duplicate(String),
    #[error("Default entry {0:?} cannot be modified")]
    DefaultEntry(String),
    #[error("{0} is still in use")]
    InUse(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("A level already exists at z = {0}")]
    DuplicateElevation(f64),
    #[error("The last level cannot be removed")]
    LastLevel,
    #[error("A polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),
    #[error("Geometry has zero length")]
    ZeroLength,
    #[error("Coordinate or value is not a finite number")]
    NonFinite,
}

/// Failure to read a document or user-definitions file. A load that returns
/// one of these has not modified the live document.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported schema version: {0}")]
    UnsupportedVersion(i64),
    #[error("Reserved default name with different content: {0}")]
    ReservedCollision(String),
    #[error("Duplicate catalog entry: {0}")]
    DuplicateEntry(String),
    #[error("Member {member} references missing node {node}")]
    MissingNode { member: usize, node: String },
    #[error("Not a user definitions file")]
    NotUserDefinitions,
    #[error("Invalid document: {0}")]
    Invalid(String),
}

/// Result type for document loading.
pub type FormatResult<T> = Result<T, FormatError>;
