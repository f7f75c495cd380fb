//! Compile the structured IR to Mangle datalog source.

use tracing::debug;

use crate::DatalogError;
use crate::ir::{AtomClause, Clause, ComparisonClause, FinalQuery, Program, Rule, Term, strip_marker};

/// Compiles a [`Program`] into Mangle source text for one named query.
///
/// The compiler only borrows the program; compiling the same query twice
/// yields identical text and never modifies the input.
pub struct QueryCompiler<'a> {
    program: &'a Program,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(program: &'a Program) -> Self {
        Self { program }
    }

    /// Compile every rule plus the query named `query_name`.
    ///
    /// Rules are emitted in declaration order, separated by a blank line,
    /// followed by the query statement. With no rules, only the query
    /// statement is returned.
    pub fn compile(&self, query_name: &str) -> Result<String, DatalogError> {
        let query = self.find_query(query_name)?;
        Ok(self.assemble(query))
    }

    /// Like [`compile`](Self::compile), but first checks that every `find`
    /// variable is bound by one of the query's `where` atoms.
    pub fn compile_checked(&self, query_name: &str) -> Result<String, DatalogError> {
        let query = self.find_query(query_name)?;
        Self::check_projection(query)?;
        Ok(self.assemble(query))
    }

    /// Compile every query in declaration order.
    pub fn compile_all(&self) -> Vec<(&'a str, String)> {
        self.program
            .queries
            .iter()
            .map(|query| (query.name.as_str(), self.assemble(query)))
            .collect()
    }

    fn find_query(&self, query_name: &str) -> Result<&'a FinalQuery, DatalogError> {
        self.program
            .query(query_name)
            .ok_or_else(|| DatalogError::QueryNotFound(query_name.to_string()))
    }

    fn assemble(&self, query: &FinalQuery) -> String {
        let rules: Vec<String> = self.program.rules.iter().map(Self::render_rule).collect();
        let statement = Self::render_query(query);

        let output = if rules.is_empty() {
            statement
        } else {
            format!("{}\n\n{}", rules.join("\n\n"), statement)
        };

        debug!(
            query = %query.name,
            rules = rules.len(),
            output_len = output.len(),
            "compiled Mangle query"
        );

        output
    }

    fn check_projection(query: &FinalQuery) -> Result<(), DatalogError> {
        for projected in &query.find {
            let name = strip_marker(projected);
            let bound = query
                .where_clauses
                .iter()
                .any(|atom| atom.variables().any(|v| v == name));
            if !bound {
                return Err(DatalogError::ProjectionNotBound {
                    query: query.name.clone(),
                    variable: name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Render a term.
    ///
    /// Variables become bare tokens. String literals are always quoted; embedded
    /// quotes are not escaped, so a literal containing `"` yields broken output.
    pub fn render_term(term: &Term) -> String {
        match term {
            Term::Variable(name) => name.clone(),
            Term::String(text) => format!("\"{}\"", text),
            Term::Number(n) => Self::render_number(n),
            Term::Bool(b) => b.to_string(),
        }
    }

    /// Integral floats (`200.0`, `1e3`) render as integers; other numbers
    /// keep their JSON form.
    fn render_number(n: &serde_json::Number) -> String {
        match n.as_f64() {
            Some(f)
                if n.is_f64()
                    && f.fract() == 0.0
                    && f >= i64::MIN as f64
                    && f < i64::MAX as f64 =>
            {
                (f as i64).to_string()
            }
            _ => n.to_string(),
        }
    }

    /// Render an atom, e.g. `!closed(HID)`.
    pub fn render_atom(atom: &AtomClause) -> String {
        let args: Vec<String> = atom.args.iter().map(Self::render_term).collect();
        let rendered = format!("{}({})", atom.predicate, args.join(", "));
        if atom.is_negated {
            format!("!{}", rendered)
        } else {
            rendered
        }
    }

    /// Render a comparison, e.g. `Price <= 500`.
    pub fn render_comparison(comparison: &ComparisonClause) -> String {
        format!(
            "{} {} {}",
            strip_marker(&comparison.variable),
            comparison.operator,
            Self::render_term(&comparison.value)
        )
    }

    pub fn render_clause(clause: &Clause) -> String {
        match clause {
            Clause::Atom(atom) => Self::render_atom(atom),
            Clause::Comparison(comparison) => Self::render_comparison(comparison),
        }
    }

    /// Render a rule statement: `head(A, B) :- body1, body2.`
    ///
    /// Head arguments are declared variables and are emitted bare even when
    /// the marker is missing.
    pub fn render_rule(rule: &Rule) -> String {
        let head_args: Vec<&str> = rule.head.args.iter().map(|a| strip_marker(a)).collect();
        let body: Vec<String> = rule.body.iter().map(Self::render_clause).collect();
        format!(
            "{}({}) :- {}.",
            rule.head.predicate,
            head_args.join(", "),
            body.join(", ")
        )
    }

    /// Render a query statement from its `where` atoms.
    ///
    /// `find` is not emitted; Mangle infers the projection from the body.
    pub fn render_query(query: &FinalQuery) -> String {
        let atoms: Vec<String> = query.where_clauses.iter().map(Self::render_atom).collect();
        format!("{}.", atoms.join(", "))
    }
}

/// Compile `program` for the query named `query_name`.
pub fn compile(program: &Program, query_name: &str) -> Result<String, DatalogError> {
    QueryCompiler::new(program).compile(query_name)
}
