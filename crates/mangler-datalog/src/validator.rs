//! Shape checks for generated programs.
//!
//! The compiler trusts its input. Programs coming from a generator should be
//! checked here first: predicate and rule names must be identifiers, query
//! names non-empty and unique, rules safe and projections bound. Problems are
//! collected rather than returned on the first hit so a caller can report
//! everything at once.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::ir::{Clause, FinalQuery, Program, Rule, VARIABLE_MARKER, strip_marker};

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][A-Za-z0-9_]*$").expect("identifier regex is valid"));

/// A shape problem found in a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// A rule or predicate name is not a valid identifier, or a query name is
    /// empty.
    InvalidName { context: String, name: String },
    /// Two queries share a name.
    DuplicateQuery { name: String },
    /// A rule has no body clauses.
    EmptyBody { rule: String },
    /// A query has no `where` atoms.
    EmptyWhere { query: String },
    /// A head variable is not bound by any positive body atom.
    UnsafeHeadVariable { rule: String, variable: String },
    /// A comparison's left side is not a variable reference.
    ComparisonWithoutVariable { rule: String, variable: String },
    /// A `find` variable is not bound by any `where` atom.
    UnboundProjection { query: String, variable: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::InvalidName { context, name } => {
                write!(f, "{}: invalid identifier '{}'", context, name)
            }
            ValidationIssue::DuplicateQuery { name } => {
                write!(f, "query '{}' is declared more than once", name)
            }
            ValidationIssue::EmptyBody { rule } => write!(f, "rule '{}' has an empty body", rule),
            ValidationIssue::EmptyWhere { query } => {
                write!(f, "query '{}' has no where atoms", query)
            }
            ValidationIssue::UnsafeHeadVariable { rule, variable } => write!(
                f,
                "rule '{}': head variable {} is not bound by a positive body atom",
                rule, variable
            ),
            ValidationIssue::ComparisonWithoutVariable { rule, variable } => write!(
                f,
                "rule '{}': comparison left side '{}' is not a variable",
                rule, variable
            ),
            ValidationIssue::UnboundProjection { query, variable } => write!(
                f,
                "query '{}': projected variable {} is not bound by a where atom",
                query, variable
            ),
        }
    }
}

/// Check a program, returning every issue found. An empty result means the
/// program satisfies the documented IR invariants.
pub fn validate_program(program: &Program) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for rule in &program.rules {
        validate_rule(rule, &mut issues);
    }

    let mut seen = HashSet::new();
    for query in &program.queries {
        if !seen.insert(query.name.as_str()) {
            issues.push(ValidationIssue::DuplicateQuery {
                name: query.name.clone(),
            });
        }
        validate_query(query, &mut issues);
    }

    issues
}

fn check_name(context: impl FnOnce() -> String, name: &str, issues: &mut Vec<ValidationIssue>) {
    if !IDENTIFIER.is_match(name) {
        issues.push(ValidationIssue::InvalidName {
            context: context(),
            name: name.to_string(),
        });
    }
}

fn validate_rule(rule: &Rule, issues: &mut Vec<ValidationIssue>) {
    check_name(|| "rule name".to_string(), &rule.name, issues);
    check_name(
        || format!("rule '{}' head", rule.name),
        &rule.head.predicate,
        issues,
    );

    if rule.body.is_empty() {
        issues.push(ValidationIssue::EmptyBody {
            rule: rule.name.clone(),
        });
    }

    let mut positive: HashSet<&str> = HashSet::new();
    for clause in &rule.body {
        match clause {
            Clause::Atom(atom) => {
                check_name(
                    || format!("rule '{}' body", rule.name),
                    &atom.predicate,
                    issues,
                );
                if !atom.is_negated {
                    positive.extend(atom.variables());
                }
            }
            Clause::Comparison(comparison) => {
                if !comparison.variable.starts_with(VARIABLE_MARKER) {
                    issues.push(ValidationIssue::ComparisonWithoutVariable {
                        rule: rule.name.clone(),
                        variable: comparison.variable.clone(),
                    });
                }
            }
        }
    }

    for arg in &rule.head.args {
        let variable = strip_marker(arg);
        if !positive.contains(variable) {
            issues.push(ValidationIssue::UnsafeHeadVariable {
                rule: rule.name.clone(),
                variable: variable.to_string(),
            });
        }
    }
}

fn validate_query(query: &FinalQuery, issues: &mut Vec<ValidationIssue>) {
    // Query names are looked up, never emitted.
    if query.name.is_empty() {
        issues.push(ValidationIssue::InvalidName {
            context: "query name".to_string(),
            name: String::new(),
        });
    }

    if query.where_clauses.is_empty() {
        issues.push(ValidationIssue::EmptyWhere {
            query: query.name.clone(),
        });
    }

    let mut bound: HashSet<&str> = HashSet::new();
    for atom in &query.where_clauses {
        check_name(
            || format!("query '{}' where", query.name),
            &atom.predicate,
            issues,
        );
        bound.extend(atom.variables());
    }

    for projected in &query.find {
        let variable = strip_marker(projected);
        if !bound.contains(variable) {
            issues.push(ValidationIssue::UnboundProjection {
                query: query.name.clone(),
                variable: variable.to_string(),
            });
        }
    }
}
