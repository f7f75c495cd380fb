//! The three-field object emitted by the fact-discovery prompt.

use serde::{Deserialize, Serialize};

/// A sketch of a Mangle program as streamed by the generator: the questions
/// it is trying to answer, base facts, and rules, each as Mangle source text.
///
/// All three fields are required arrays of strings. Field order does not
/// matter and unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MangleSketch {
    pub guiding_questions: Vec<String>,
    pub mangle_facts: Vec<String>,
    pub mangle_rules: Vec<String>,
}
