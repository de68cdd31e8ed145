use std::{io, path::PathBuf};
use thiserror::Error;
use tokio::task::JoinError;

/**
Result type to simplify function signatures.

This is a custom result type that uses our custom `QueryRunnerError` for the error type.

Functions can return `QueryRunnerResult<T>` and then use `?` to automatically propagate errors.
*/
pub type QueryRunnerResult<T> = Result<T, QueryRunnerError>;

/**
Custom error type for the SQL Query Runner.

This enum defines all the possible errors that can occur in the application.

We use the `thiserror` crate to derive the `Error` trait and automatically
implement `Display` using the `#[error(...)]` attribute.
*/
#[derive(Error, Debug)]
pub enum QueryRunnerError {
    // Wrapper for standard IO errors.
    // The #[from] attribute automatically converts io::Error to QueryRunnerError::Io.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // Errors serializing or deserializing JSON (persisted state, JSON export).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Errors raised by the XLSX encoder while building a spreadsheet export.
    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    // Errors raised by the PDF encoder while building a document export.
    #[error("PDF error: {0}")]
    Pdf(String),

    // Errors formatting timestamps (RFC 3339).
    #[error("Timestamp format error: {0}")]
    TimeFormat(#[from] time::error::Format),

    /// The current query text does not match any predefined query of the
    /// selected table. This is the user-visible validation failure of the
    /// pseudo-execution step.
    #[error(
        "This query is not predefined in the system.\n\
        Only predefined queries can be executed in this demo."
    )]
    NotPredefined,

    // Wrapper for Tokio JoinErrors, occurring when asynchronous tasks fail.
    #[error("Tokio JoinError: {0}")]
    TokioJoin(#[from] JoinError),

    // Errors occurring when receiving data from asynchronous channels.
    #[error("Channel receive error: {0}")]
    ChannelReceive(String),

    /// The persistence directory could not be determined or created.
    #[error("Storage directory unavailable: {0:#?}")]
    StorageDir(PathBuf),

    // Indicates that a provided export path or format is not supported.
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    // A catch-all for other, less specific errors not covered by specific variants.
    // Uses a String to describe the error. Consider using this sparingly.
    #[error("Other error: {0}")]
    Other(String),
}

// Implementation of the From trait to convert a String into a QueryRunnerError.
// This allows us to easily convert generic error strings into our custom error type.
impl From<String> for QueryRunnerError {
    fn from(err: String) -> QueryRunnerError {
        // Prefer using specific error variants when possible, fallback to Other.
        QueryRunnerError::Other(err)
    }
}
