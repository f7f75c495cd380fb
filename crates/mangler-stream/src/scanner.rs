//! Incremental brace-depth scanner over chunked text.
//!
//! The generator streams zero or more JSON objects back to back, split at
//! arbitrary points. [`ObjectScanner`] buffers the text and hands out each
//! top-level object as soon as its closing brace has arrived.
//!
//! Only structural braces are tracked; braces inside string literals are
//! counted as well. A value such as `"a } b"` therefore corrupts the depth
//! count for the object that contains it. Generated payloads are Mangle
//! source text, which has no braces, so this is accepted.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use tracing::trace;

use crate::{MangleSketch, ObjectError, TrailingData};

/// Scanner state: the unconsumed buffer, the brace depth, and where the
/// currently open top-level object started.
///
/// `cursor` marks the first byte not yet scanned, so text that arrived in an
/// earlier chunk is never counted twice.
#[derive(Debug)]
pub struct ObjectScanner<T = MangleSketch> {
    buffer: String,
    depth: usize,
    start: Option<usize>,
    cursor: usize,
    _shape: PhantomData<fn() -> T>,
}

impl<T> Default for ObjectScanner<T> {
    fn default() -> Self {
        Self {
            buffer: String::new(),
            depth: 0,
            start: None,
            cursor: 0,
            _shape: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> ObjectScanner<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk to the buffer. Nothing is scanned until
    /// [`next_object`](Self::next_object) is called.
    pub fn push(&mut self, chunk: &str) {
        self.buffer.push_str(chunk);
        trace!(
            chunk_len = chunk.len(),
            buffered = self.buffer.len(),
            depth = self.depth,
            "buffered chunk"
        );
    }

    /// Scan forward to the next complete top-level object.
    ///
    /// Returns `None` when the buffer holds no further complete object. A
    /// candidate that fails to decode or validate is returned as an error;
    /// it has already been dropped from the buffer and scanning may continue.
    pub fn next_object(&mut self) -> Option<Result<T, ObjectError>> {
        let bytes = self.buffer.as_bytes();

        while self.cursor < bytes.len() {
            let index = self.cursor;
            self.cursor += 1;

            match bytes[index] {
                b'{' => {
                    if self.depth == 0 {
                        self.start = Some(index);
                    }
                    self.depth += 1;
                }
                b'}' => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth == 0
                        && let Some(start) = self.start.take()
                    {
                        let outcome = Self::decode(&self.buffer[start..=index]);
                        self.buffer.drain(..=index);
                        self.cursor = 0;
                        return Some(outcome);
                    }
                }
                _ => {}
            }
        }

        None
    }

    /// Push a chunk and collect every object it completes.
    pub fn feed(&mut self, chunk: &str) -> Vec<Result<T, ObjectError>> {
        self.push(chunk);
        std::iter::from_fn(|| self.next_object()).collect()
    }

    /// End of input. Reports leftover non-whitespace content and resets the
    /// scanner.
    pub fn finish(&mut self) -> Option<TrailingData> {
        let remainder = std::mem::take(&mut self.buffer);
        self.depth = 0;
        self.start = None;
        self.cursor = 0;

        if remainder.trim().is_empty() {
            None
        } else {
            Some(TrailingData { remainder })
        }
    }

    /// Unconsumed text.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Current brace depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether a top-level object is currently open.
    pub fn in_object(&self) -> bool {
        self.start.is_some()
    }

    fn decode(text: &str) -> Result<T, ObjectError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|source| ObjectError::Decode {
                source,
                text: text.to_string(),
            })?;

        serde_json::from_value(value).map_err(|source| ObjectError::Shape {
            source,
            text: text.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FIRST: &str =
        r#"{"guiding_questions":["q1"],"mangle_facts":["f(1)."],"mangle_rules":["r(X) :- f(X)."]}"#;
    const SECOND: &str = r#"{"mangle_rules":[],"mangle_facts":["g(2)."],"guiding_questions":["q2"]}"#;

    fn ok(results: Vec<Result<MangleSketch, ObjectError>>) -> Vec<MangleSketch> {
        results.into_iter().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn test_single_object_in_one_chunk() {
        let mut scanner = ObjectScanner::<MangleSketch>::new();
        let objects = ok(scanner.feed(FIRST));

        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].guiding_questions, vec!["q1"]);
        assert_eq!(scanner.buffered(), "");
        assert_eq!(scanner.depth(), 0);
        assert!(scanner.finish().is_none());
    }

    #[test]
    fn test_back_to_back_objects() {
        let mut scanner = ObjectScanner::<MangleSketch>::new();
        let objects = ok(scanner.feed(&format!("{}\n{}", FIRST, SECOND)));

        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].guiding_questions, vec!["q1"]);
        assert_eq!(objects[1].guiding_questions, vec!["q2"]);
    }

    #[test]
    fn test_object_split_inside_array() {
        let mut scanner = ObjectScanner::<MangleSketch>::new();
        let (head, tail) = FIRST.split_at(FIRST.find("f(1)").unwrap());

        assert!(scanner.feed(head).is_empty());
        assert_eq!(scanner.depth(), 1);
        assert!(scanner.in_object());

        let objects = ok(scanner.feed(tail));
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].mangle_facts, vec!["f(1)."]);
        assert!(!scanner.in_object());
    }

    #[test]
    fn test_one_byte_chunks() {
        let text = format!("{}{}", FIRST, SECOND);
        let mut scanner = ObjectScanner::<MangleSketch>::new();
        let mut objects = Vec::new();
        for ch in text.chars() {
            objects.extend(ok(scanner.feed(&ch.to_string())));
        }

        assert_eq!(objects.len(), 2);
        assert_eq!(objects[1].mangle_facts, vec!["g(2)."]);
    }

    #[test]
    fn test_nested_objects_are_one_candidate() {
        let mut scanner = ObjectScanner::<serde_json::Value>::new();
        let results = scanner.feed(r#"{"a":{"b":{}}}{"c":1}"#);

        let values: Vec<serde_json::Value> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(
            values,
            vec![
                serde_json::json!({"a": {"b": {}}}),
                serde_json::json!({"c": 1})
            ]
        );
    }

    #[test]
    fn test_decode_error_then_valid_object() {
        let mut scanner = ObjectScanner::<MangleSketch>::new();
        let results = scanner.feed(&format!("{{not json}}{}", SECOND));

        assert_eq!(results.len(), 2);
        match &results[0] {
            Err(ObjectError::Decode { text, .. }) => assert_eq!(text, "{not json}"),
            other => panic!("expected decode error, got {other:?}"),
        }
        assert_eq!(
            results[1].as_ref().unwrap().guiding_questions,
            vec!["q2"]
        );
    }

    #[test]
    fn test_shape_error() {
        let mut scanner = ObjectScanner::<MangleSketch>::new();
        let results = scanner.feed(r#"{"guiding_questions":["q"],"mangle_facts":[]}"#);

        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(ObjectError::Shape { .. })));
        assert_eq!(scanner.buffered(), "");
    }

    #[test]
    fn test_leading_noise_is_consumed_with_object() {
        let mut scanner = ObjectScanner::<MangleSketch>::new();
        let objects = ok(scanner.feed(&format!("Here you go:\n```json\n{}", FIRST)));

        assert_eq!(objects.len(), 1);
        assert_eq!(scanner.buffered(), "");
    }

    #[test]
    fn test_truncated_object_is_trailing_data() {
        let mut scanner = ObjectScanner::<MangleSketch>::new();
        let objects = ok(scanner.feed(&format!("{}{{\"guiding_questions\": [\"q", FIRST)));
        assert_eq!(objects.len(), 1);

        let trailing = scanner.finish().unwrap();
        assert_eq!(trailing.remainder, "{\"guiding_questions\": [\"q");
        assert_eq!(scanner.buffered(), "");
        assert_eq!(scanner.depth(), 0);
    }

    #[test]
    fn test_trailing_whitespace_is_not_reported() {
        let mut scanner = ObjectScanner::<MangleSketch>::new();
        scanner.feed(&format!("{}\n\n  \t", FIRST));
        assert!(scanner.finish().is_none());
    }

    #[test]
    fn test_stray_closing_brace_floors_depth() {
        let mut scanner = ObjectScanner::<MangleSketch>::new();
        let objects = ok(scanner.feed(&format!("}}}}{}", FIRST)));

        assert_eq!(objects.len(), 1);
        assert_eq!(scanner.depth(), 0);
    }

    #[test]
    fn test_brace_inside_string_corrupts_depth() {
        // Known limitation: the closing brace inside the string value ends the
        // object early, and the real closing brace is left over.
        let text = r#"{"guiding_questions":["a } b"],"mangle_facts":[],"mangle_rules":[]}"#;
        let mut scanner = ObjectScanner::<MangleSketch>::new();
        let results = scanner.feed(text);

        assert_eq!(results.len(), 1);
        match &results[0] {
            Err(ObjectError::Decode { text, .. }) => {
                assert_eq!(text, r#"{"guiding_questions":["a }"#)
            }
            other => panic!("expected decode error, got {other:?}"),
        }
        assert_eq!(
            scanner.finish().unwrap().remainder,
            r#" b"],"mangle_facts":[],"mangle_rules":[]}"#
        );
    }

    #[test]
    fn test_multibyte_text_around_objects() {
        let text = r#"« voilà » {"guiding_questions":["où ?"],"mangle_facts":[],"mangle_rules":[]} ✓"#;
        let mut scanner = ObjectScanner::<MangleSketch>::new();
        let objects = ok(scanner.feed(text));

        assert_eq!(objects[0].guiding_questions, vec!["où ?"]);
        assert_eq!(scanner.finish().unwrap().remainder, " ✓");
    }
}
