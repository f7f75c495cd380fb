//! Structured IR for Mangle programs.
//!
//! A [`Program`] is produced once by an external generator (usually an LLM
//! prompted with a JSON schema) and is treated as immutable input by the
//! compiler. The wire format is camelCase JSON; terms are bare JSON scalars
//! where a string starting with `?` denotes a variable.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::DatalogError;

/// Marker that distinguishes a variable reference from a string literal.
pub const VARIABLE_MARKER: char = '?';

/// Strip the variable marker from `name`, if present.
pub fn strip_marker(name: &str) -> &str {
    name.strip_prefix(VARIABLE_MARKER).unwrap_or(name)
}

/// A single term in an atom or on the right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawTerm", into = "RawTerm")]
pub enum Term {
    /// Variable reference, stored without the marker.
    Variable(String),
    /// String literal. Rendered quoted, without escaping.
    String(String),
    /// Number in its canonical JSON form.
    Number(serde_json::Number),
    /// Boolean literal.
    Bool(bool),
}

impl Term {
    /// Create a variable term. A leading marker is accepted and dropped.
    pub fn var(name: impl AsRef<str>) -> Self {
        Term::Variable(strip_marker(name.as_ref()).to_string())
    }

    /// Create a string literal term.
    pub fn string(text: impl Into<String>) -> Self {
        Term::String(text.into())
    }

    /// Create a float term. Returns `None` for NaN and infinities.
    pub fn float(value: f64) -> Option<Self> {
        serde_json::Number::from_f64(value).map(Term::Number)
    }

    /// The variable name, if this term is a variable.
    pub fn as_variable(&self) -> Option<&str> {
        match self {
            Term::Variable(name) => Some(name),
            _ => None,
        }
    }
}

impl From<&str> for Term {
    fn from(text: &str) -> Self {
        RawTerm::Text(text.to_string()).into()
    }
}

impl From<String> for Term {
    fn from(text: String) -> Self {
        RawTerm::Text(text).into()
    }
}

impl From<i32> for Term {
    fn from(value: i32) -> Self {
        Term::Number(value.into())
    }
}

impl From<i64> for Term {
    fn from(value: i64) -> Self {
        Term::Number(value.into())
    }
}

impl From<bool> for Term {
    fn from(value: bool) -> Self {
        Term::Bool(value)
    }
}

/// Wire representation of a term: an untagged JSON scalar.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawTerm {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl From<RawTerm> for Term {
    fn from(raw: RawTerm) -> Self {
        match raw {
            RawTerm::Text(text) => match text.strip_prefix(VARIABLE_MARKER) {
                Some(name) => Term::Variable(name.to_string()),
                None => Term::String(text),
            },
            RawTerm::Number(n) => Term::Number(n),
            RawTerm::Bool(b) => Term::Bool(b),
        }
    }
}

impl From<Term> for RawTerm {
    fn from(term: Term) -> Self {
        match term {
            Term::Variable(name) => RawTerm::Text(format!("{VARIABLE_MARKER}{name}")),
            Term::String(text) => RawTerm::Text(text),
            Term::Number(n) => RawTerm::Number(n),
            Term::Bool(b) => RawTerm::Bool(b),
        }
    }
}

/// A predicate applied to terms, optionally negated.
///
/// `where` atoms in queries sometimes carry a redundant `"type": "atom"`
/// field; unknown fields are ignored so both forms parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtomClause {
    pub predicate: String,
    pub args: Vec<Term>,
    #[serde(default)]
    pub is_negated: bool,
}

impl AtomClause {
    pub fn new(predicate: impl Into<String>, args: Vec<Term>) -> Self {
        Self {
            predicate: predicate.into(),
            args,
            is_negated: false,
        }
    }

    /// Return a negated copy of this atom.
    pub fn negated(mut self) -> Self {
        self.is_negated = true;
        self
    }

    /// Variable names occurring in the arguments, in order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.args.iter().filter_map(Term::as_variable)
    }
}

/// Built-in infix comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl ComparisonOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonOperator::Lt => "<",
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Le => "<=",
            ComparisonOperator::Ge => ">=",
            ComparisonOperator::Eq => "==",
            ComparisonOperator::Ne => "!=",
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `variable operator value`, e.g. `?Price <= 500`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonClause {
    /// Left-hand variable, normally written with the marker.
    pub variable: String,
    pub operator: ComparisonOperator,
    pub value: Term,
}

impl ComparisonClause {
    pub fn new(
        variable: impl Into<String>,
        operator: ComparisonOperator,
        value: impl Into<Term>,
    ) -> Self {
        Self {
            variable: variable.into(),
            operator,
            value: value.into(),
        }
    }
}

/// A clause in a rule body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Clause {
    Atom(AtomClause),
    Comparison(ComparisonClause),
}

impl From<AtomClause> for Clause {
    fn from(atom: AtomClause) -> Self {
        Clause::Atom(atom)
    }
}

impl From<ComparisonClause> for Clause {
    fn from(comparison: ComparisonClause) -> Self {
        Clause::Comparison(comparison)
    }
}

/// Head of a rule: the derived predicate and its variable arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleHead {
    pub predicate: String,
    /// Declared variables, normally written with the marker.
    #[serde(alias = "headArguments")]
    pub args: Vec<String>,
}

/// A named derivation of a head predicate from a conjunction of clauses.
///
/// Producers must uphold the safety condition: every head variable occurs in
/// some non-negated body atom. The compiler does not check it; see
/// [`crate::validator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub name: String,
    /// Plain-language question the rule answers. Metadata only.
    #[serde(default)]
    pub natural_language_goal: String,
    #[serde(alias = "ruleHead")]
    pub head: RuleHead,
    #[serde(alias = "ruleBody")]
    pub body: Vec<Clause>,
}

/// A named query over the program's rules and base facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalQuery {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Projected variables. Descriptive only; not emitted.
    #[serde(default)]
    pub find: Vec<String>,
    #[serde(rename = "where")]
    pub where_clauses: Vec<AtomClause>,
}

/// Rules plus named queries, both in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub queries: Vec<FinalQuery>,
}

impl Program {
    /// Parse a program from its JSON IR.
    pub fn from_json(json: &str) -> Result<Self, DatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a program from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, DatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Find a query by name.
    pub fn query(&self, name: &str) -> Option<&FinalQuery> {
        self.queries.iter().find(|q| q.name == name)
    }
}
