//! Error types for the datalog IR and compiler.

use thiserror::Error;

/// Errors that can occur in datalog operations.
#[derive(Debug, Error)]
pub enum DatalogError {
    /// The requested query is not part of the program.
    #[error("query with name \"{0}\" not found in Mangle program")]
    QueryNotFound(String),

    /// A projected variable never occurs in the query's `where` atoms.
    #[error("query \"{query}\" projects variable {variable} which is not bound by any where atom")]
    ProjectionNotBound { query: String, variable: String },

    /// JSON error while reading a program.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
