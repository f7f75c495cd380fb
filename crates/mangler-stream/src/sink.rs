//! Diagnostic sinks for per-object extraction failures.
//!
//! Rejected objects and trailing data never fail the stream. They are handed
//! to a [`DiagnosticSink`] injected by the caller instead.

use std::sync::{Arc, Mutex};

use tracing::{error, warn};

use crate::{ObjectError, TrailingData};

/// A non-fatal extraction event.
#[derive(Debug)]
pub enum Diagnostic {
    /// A complete candidate object failed to decode or validate. It was
    /// discarded and scanning continued.
    Rejected(ObjectError),
    /// The stream ended with unconsumed, non-whitespace content.
    TrailingData(TrailingData),
}

/// Coarse classification of a [`Diagnostic`], for counting and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    Decode,
    Shape,
    TrailingData,
}

impl Diagnostic {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Diagnostic::Rejected(ObjectError::Decode { .. }) => DiagnosticKind::Decode,
            Diagnostic::Rejected(ObjectError::Shape { .. }) => DiagnosticKind::Shape,
            Diagnostic::TrailingData(_) => DiagnosticKind::TrailingData,
        }
    }
}

/// Receives extraction diagnostics.
pub trait DiagnosticSink {
    fn report(&self, diagnostic: Diagnostic);
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for Arc<S> {
    fn report(&self, diagnostic: Diagnostic) {
        (**self).report(diagnostic)
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &S {
    fn report(&self, diagnostic: Diagnostic) {
        (**self).report(diagnostic)
    }
}

/// Logs diagnostics through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::Rejected(err) => {
                error!(error = %err, text = err.text(), "discarded streamed object");
            }
            Diagnostic::TrailingData(trailing) => {
                warn!(remainder = %trailing.remainder, "stream ended with unprocessed data in buffer");
            }
        }
    }
}

/// Keeps diagnostics in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything collected so far.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.lock())
    }

    /// Kinds of the collected diagnostics, in report order.
    pub fn kinds(&self) -> Vec<DiagnosticKind> {
        self.lock().iter().map(Diagnostic::kind).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Diagnostic>> {
        self.diagnostics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.lock().push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_error() -> ObjectError {
        let source = serde_json::from_str::<serde_json::Value>("{oops}").unwrap_err();
        ObjectError::Decode {
            source,
            text: "{oops}".to_string(),
        }
    }

    fn shape_error() -> ObjectError {
        let source = serde_json::from_str::<Vec<String>>("{}").unwrap_err();
        ObjectError::Shape {
            source,
            text: "{}".to_string(),
        }
    }

    #[test]
    fn test_collecting_sink_keeps_order() {
        let sink = CollectingSink::new();
        sink.report(Diagnostic::Rejected(shape_error()));
        sink.report(Diagnostic::Rejected(decode_error()));
        sink.report(Diagnostic::TrailingData(TrailingData {
            remainder: "{".to_string(),
        }));

        assert_eq!(
            sink.kinds(),
            vec![
                DiagnosticKind::Shape,
                DiagnosticKind::Decode,
                DiagnosticKind::TrailingData
            ]
        );
        assert_eq!(sink.len(), 3);
    }

    #[test]
    fn test_take_drains() {
        let sink = CollectingSink::new();
        sink.report(Diagnostic::Rejected(decode_error()));

        let taken = sink.take();
        assert_eq!(taken.len(), 1);
        match &taken[0] {
            Diagnostic::Rejected(err) => assert_eq!(err.text(), "{oops}"),
            other => panic!("unexpected diagnostic: {other:?}"),
        }
        assert!(sink.is_empty());
    }

    #[test]
    fn test_shared_sink_through_arc() {
        let sink = Arc::new(CollectingSink::new());
        let handle: Arc<CollectingSink> = Arc::clone(&sink);
        handle.report(Diagnostic::Rejected(decode_error()));
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_tracing_sink_accepts_all_kinds() {
        TracingSink.report(Diagnostic::Rejected(decode_error()));
        TracingSink.report(Diagnostic::TrailingData(TrailingData {
            remainder: "[".to_string(),
        }));
    }
}
