//! Mangler: compile generated Datalog IR and extract streamed program sketches.
//!
//! Main binary with subcommands:
//! - `compile`: Compile a program IR to Mangle source for one query (or all)
//! - `check`: Report shape problems in a program IR
//! - `extract`: Pull validated objects out of a chunked JSON stream

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod compile;
mod extract;

/// Parse boolean from environment variable, accepting common truthy values.
/// Accepts "1", "true", "yes", "on" (case-insensitive) as true.
/// Accepts "0", "false", "no", "off", "" (case-insensitive) as false.
fn parse_bool_env(s: &str) -> Result<bool, String> {
    match s.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(format!(
            "invalid boolean value '{}', expected 1/true/yes/on or 0/false/no/off",
            s
        )),
    }
}

#[derive(Parser)]
#[command(name = "mangler")]
#[command(about = "Mangle Datalog IR compiler and stream extractor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a program IR (JSON) to Mangle source
    Compile {
        /// Program IR file
        #[arg(long, env = "MANGLER_PROGRAM")]
        program: PathBuf,

        /// Name of the query to compile
        #[arg(long, env = "MANGLER_QUERY", required_unless_present = "all")]
        query: Option<String>,

        /// Compile every query, each preceded by a comment with its name
        #[arg(long, conflicts_with = "query")]
        all: bool,

        /// Fail when a `find` variable is not bound by the query's where atoms
        #[arg(long, env = "MANGLER_CHECK_PROJECTION", value_parser = parse_bool_env, default_value = "false")]
        check_projection: bool,
    },

    /// Check a program IR against the documented shape invariants
    Check {
        /// Program IR file
        #[arg(long, env = "MANGLER_PROGRAM")]
        program: PathBuf,
    },

    /// Extract validated objects from a stream of concatenated JSON objects
    Extract {
        /// Input file (defaults to stdin)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Read size in bytes
        #[arg(long, env = "MANGLER_CHUNK_SIZE", default_value = "4096")]
        chunk_size: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; stdout carries command output, so log to stderr
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "mangler=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            program,
            query,
            all,
            check_projection,
        } => {
            let output = if all {
                compile::compile_all(&program)?
            } else {
                let query = query.ok_or_else(|| miette::miette!("--query is required"))?;
                compile::compile_query(&program, &query, check_projection)?
            };
            println!("{}", output);
            Ok(())
        }

        Commands::Check { program } => compile::check(&program),

        Commands::Extract { input, chunk_size } => {
            let mut stdout = std::io::stdout().lock();
            let count = match input {
                Some(path) => {
                    let file = tokio::fs::File::open(&path)
                        .await
                        .map_err(|e| miette::miette!("failed to open {}: {}", path.display(), e))?;
                    extract::run(file, chunk_size, &mut stdout).await?
                }
                None => extract::run(tokio::io::stdin(), chunk_size, &mut stdout).await?,
            };
            tracing::info!(objects = count, "extraction finished");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_env() {
        assert_eq!(parse_bool_env("YES"), Ok(true));
        assert_eq!(parse_bool_env("off"), Ok(false));
        assert_eq!(parse_bool_env(""), Ok(false));
        assert!(parse_bool_env("maybe").is_err());
    }

    #[test]
    fn test_compile_requires_query_or_all() {
        let result = Cli::try_parse_from(["mangler", "compile", "--program", "p.json"]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from(["mangler", "compile", "--program", "p.json", "--all"]).unwrap();
        assert!(matches!(cli.command, Commands::Compile { all: true, query: None, .. }));
    }

    #[test]
    fn test_compile_query_and_all_conflict() {
        let result = Cli::try_parse_from([
            "mangler", "compile", "--program", "p.json", "--query", "q1", "--all",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_extract_defaults() {
        let cli = Cli::try_parse_from(["mangler", "extract"]).unwrap();
        match cli.command {
            Commands::Extract { input, chunk_size } => {
                assert!(input.is_none());
                assert_eq!(chunk_size, 4096);
            }
            _ => panic!("expected extract command"),
        }
    }
}
