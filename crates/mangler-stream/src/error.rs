//! Error types for stream extraction.

use thiserror::Error;

/// Why a complete candidate object was discarded.
#[derive(Debug, Error)]
pub enum ObjectError {
    /// The candidate was not valid JSON.
    #[error("failed to decode object: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        /// The candidate text, from opening to closing brace.
        text: String,
    },

    /// The candidate decoded but did not have the expected shape.
    #[error("object does not match the expected shape: {source}")]
    Shape {
        #[source]
        source: serde_json::Error,
        text: String,
    },
}

impl ObjectError {
    /// The discarded candidate text.
    pub fn text(&self) -> &str {
        match self {
            ObjectError::Decode { text, .. } | ObjectError::Shape { text, .. } => text,
        }
    }
}

/// Errors that end an extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The upstream chunk source failed.
    #[error("chunk source failed: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Unconsumed, non-whitespace content left in the buffer at stream end.
///
/// Non-fatal: objects yielded before the end stay valid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("stream ended with {} bytes of unprocessed data", .remainder.len())]
pub struct TrailingData {
    pub remainder: String,
}
