//! Mangle datalog IR and query compiler.
//!
//! This crate provides functionality to:
//! - Deserialize the structured rule/query IR produced by a generator
//! - Check a program against the documented IR shape invariants
//! - Compile a program to Mangle source text for one named query

mod compiler;
mod error;
pub mod ir;
pub mod validator;

pub use compiler::{QueryCompiler, compile};
pub use error::DatalogError;
pub use ir::{
    AtomClause, Clause, ComparisonClause, ComparisonOperator, FinalQuery, Program, Rule, RuleHead,
    Term,
};
pub use validator::{ValidationIssue, validate_program};
