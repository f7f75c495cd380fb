//! `compile` and `check` subcommands.

use std::path::Path;

use mangler_datalog::{Program, QueryCompiler, validate_program};
use miette::Result;
use tracing::{info, warn};

fn load(path: &Path) -> Result<Program> {
    Program::from_path(path)
        .map_err(|e| miette::miette!("failed to load program {}: {}", path.display(), e))
}

/// Compile one query from the program at `path`.
pub fn compile_query(path: &Path, query: &str, check_projection: bool) -> Result<String> {
    let program = load(path)?;
    let compiler = QueryCompiler::new(&program);

    let compiled = if check_projection {
        compiler.compile_checked(query)
    } else {
        compiler.compile(query)
    };

    compiled.map_err(|e| miette::miette!("{}", e))
}

/// Compile every query, each headed by a `# name` comment.
pub fn compile_all(path: &Path) -> Result<String> {
    let program = load(path)?;
    let compiled = QueryCompiler::new(&program).compile_all();
    if compiled.is_empty() {
        warn!(program = %path.display(), "program declares no queries");
    }

    Ok(compiled
        .into_iter()
        .map(|(name, text)| format!("# {}\n{}", name, text))
        .collect::<Vec<_>>()
        .join("\n\n"))
}

/// Validate the program and print every issue found.
pub fn check(path: &Path) -> Result<()> {
    let program = load(path)?;
    let issues = validate_program(&program);

    if issues.is_empty() {
        info!(
            rules = program.rules.len(),
            queries = program.queries.len(),
            "program is well-formed"
        );
        return Ok(());
    }

    for issue in &issues {
        println!("{}", issue);
    }
    Err(miette::miette!("{} issue(s) found in {}", issues.len(), path.display()))
}
