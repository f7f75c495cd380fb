//! Async extraction of validated objects from a chunk stream.

use std::pin::Pin;
use std::task::{Context, Poll, ready};

use futures_util::Stream;
use futures_util::stream::FusedStream;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::sink::{Diagnostic, DiagnosticSink};
use crate::{ExtractError, MangleSketch, ObjectScanner};

/// Stream of objects extracted from an upstream chunk source.
///
/// Each object is yielded as soon as its closing brace arrives. Objects that
/// fail to decode or validate go to the sink and are skipped. The stream is
/// single-use: it ends after the source ends or fails. Either way, text
/// left in the buffer is reported to the sink as trailing data.
///
/// The source is owned by the stream and dropped as soon as it is exhausted
/// or fails. Dropping the stream early drops the source with it.
pub struct ObjectStream<S, T = MangleSketch, K = crate::TracingSink> {
    source: Option<S>,
    scanner: ObjectScanner<T>,
    sink: K,
}

// The source is only ever polled through `Pin::new`, which requires
// `S: Unpin`; nothing else is structurally pinned.
impl<S, T, K> Unpin for ObjectStream<S, T, K> {}

impl<S, E, T, K> ObjectStream<S, T, K>
where
    S: Stream<Item = Result<String, E>> + Unpin,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
    T: DeserializeOwned,
    K: DiagnosticSink,
{
    pub fn new(source: S, sink: K) -> Self {
        Self {
            source: Some(source),
            scanner: ObjectScanner::new(),
            sink,
        }
    }

    /// Whether the upstream source is still held.
    pub fn is_source_open(&self) -> bool {
        self.source.is_some()
    }
}

/// Extract [`MangleSketch`] objects from `source`, reporting rejected
/// objects and trailing data to `sink`.
pub fn extract<S, E, K>(source: S, sink: K) -> ObjectStream<S, MangleSketch, K>
where
    S: Stream<Item = Result<String, E>> + Unpin,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
    K: DiagnosticSink,
{
    ObjectStream::new(source, sink)
}

impl<S, E, T, K> Stream for ObjectStream<S, T, K>
where
    S: Stream<Item = Result<String, E>> + Unpin,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
    T: DeserializeOwned,
    K: DiagnosticSink,
{
    type Item = Result<T, ExtractError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            while let Some(outcome) = this.scanner.next_object() {
                match outcome {
                    Ok(object) => return Poll::Ready(Some(Ok(object))),
                    Err(err) => this.sink.report(Diagnostic::Rejected(err)),
                }
            }

            let Some(source) = this.source.as_mut() else {
                return Poll::Ready(None);
            };

            match ready!(Pin::new(source).poll_next(cx)) {
                Some(Ok(chunk)) => this.scanner.push(&chunk),
                Some(Err(err)) => {
                    this.source = None;
                    let err = ExtractError::Source(err.into());
                    debug!(error = %err, "chunk source failed, released");
                    if let Some(trailing) = this.scanner.finish() {
                        this.sink.report(Diagnostic::TrailingData(trailing));
                    }
                    return Poll::Ready(Some(Err(err)));
                }
                None => {
                    this.source = None;
                    debug!("chunk source exhausted, released");
                    if let Some(trailing) = this.scanner.finish() {
                        this.sink.report(Diagnostic::TrailingData(trailing));
                    }
                    return Poll::Ready(None);
                }
            }
        }
    }
}

impl<S, E, T, K> FusedStream for ObjectStream<S, T, K>
where
    S: Stream<Item = Result<String, E>> + Unpin,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
    T: DeserializeOwned,
    K: DiagnosticSink,
{
    fn is_terminated(&self) -> bool {
        self.source.is_none()
    }
}
