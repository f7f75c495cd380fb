//! Incremental extraction of JSON objects from chunked text.
//!
//! Generators stream their answer as text fragments whose concatenation is
//! zero or more JSON objects back to back. This crate provides:
//! - [`ObjectScanner`]: the explicit push/pull state machine over the text
//! - [`ObjectStream`]: an async stream of validated objects over any chunk source
//! - [`DiagnosticSink`]: an injectable channel for rejected objects and trailing data
//! - [`read_chunks`]: a chunk source over an async reader

mod error;
mod extract;
mod scanner;
pub mod sink;
mod sketch;
mod source;

pub use error::{ExtractError, ObjectError, TrailingData};
pub use extract::{ObjectStream, extract};
pub use scanner::ObjectScanner;
pub use sink::{CollectingSink, Diagnostic, DiagnosticKind, DiagnosticSink, TracingSink};
pub use sketch::MangleSketch;
pub use source::read_chunks;
