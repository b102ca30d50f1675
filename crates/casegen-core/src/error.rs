//! Error types for casegen-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in casegen-core
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV parsing error from the csv crate
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The row source has a header but no records
    #[error("CSV '{path}' is empty")]
    RowSourceEmpty { path: PathBuf },

    /// The row source has no `case_name` column, or a record lacks a value for it.
    /// `record` is 0 for the header, otherwise the 1-based record number.
    #[error("CSV '{path}' must include a \"case_name\" column (missing at record {record})")]
    RowSourceSchemaMissingCaseName { path: PathBuf, record: usize },

    /// A case name that is not a single plain directory name
    #[error("CSV '{path}' record {record}: case_name {name:?} must be a single directory name")]
    InvalidCaseName {
        path: PathBuf,
        record: usize,
        name: String,
    },

    /// The case-name allow-list selected nothing
    #[error("no matching case_name rows for selection: {}", .requested.join(","))]
    NoMatchingRowsForFilter { requested: Vec<String> },

    /// A mapping entry lacks a required field; fails the row that applies it
    #[error("malformed mapping: {0}")]
    MalformedMapping(String),

    /// The mapping file could not be parsed
    #[error("invalid mapping file '{path}': {source}")]
    InvalidMapping {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The reference case directory is missing
    #[error("reference case not found or not a directory: {0}")]
    ReferenceNotFound(PathBuf),

    /// Destination case directory exists and overwrite is off
    #[error("destination already exists: {0}")]
    DestinationAlreadyExists(PathBuf),

    /// Copying the reference tree failed
    #[error("failed to copy '{from}' to '{to}': {source}")]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file named in the mapping does not exist in the case
    #[error("file not found in case: {0}")]
    FileNotFoundInCase(PathBuf),

    /// A key update references a column the row lacks
    #[error("CSV missing column '{column}' required for key '{key}' in {path}")]
    ColumnMissingForKeyUpdate {
        column: String,
        key: String,
        path: PathBuf,
    },

    /// No `key value;` line was found for the key
    #[error("key '{key}' not found")]
    KeyNotFound { key: String },

    /// A regex update placeholder references a column the row lacks
    #[error("mapping references CSV column '{column}' (placeholder '{placeholder}') which is missing in the row")]
    MissingColumnForRegexParam { column: String, placeholder: String },

    /// The replacement template uses a placeholder with no `params` entry
    #[error("replacement placeholder '{0}' not provided in params")]
    MissingPlaceholderInReplacement(String),

    /// The replacement template or its escapes are malformed
    #[error("malformed replacement '{replacement}': {message}")]
    MalformedReplacement { replacement: String, message: String },

    /// The regex pattern failed to compile
    #[error("invalid regex pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The mapping contains an update with an unrecognised `type`
    #[error("unknown update type: {0:?}")]
    UnknownUpdateType(String),

    /// One or more rows failed during building
    #[error("completed with {failed} error(s) out of {total} case(s)")]
    BatchFailed { failed: usize, total: usize },

    /// Directory traversal error
    #[error("failed to traverse directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
