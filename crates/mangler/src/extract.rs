//! `extract` subcommand.

use std::io::Write;

use futures_util::StreamExt;
use mangler_stream::{TracingSink, extract, read_chunks};
use miette::{IntoDiagnostic, Result};
use tokio::io::AsyncRead;
use tracing::debug;

/// Stream objects from `reader` to `out`, one JSON document per line.
/// Returns the number of objects written.
pub async fn run<R, W>(reader: R, chunk_size: usize, out: &mut W) -> Result<usize>
where
    R: AsyncRead + Unpin,
    W: Write,
{
    let mut objects = extract(read_chunks(reader, chunk_size), TracingSink);
    let mut count = 0;

    while let Some(object) = objects.next().await {
        let object = object.map_err(|e| miette::miette!("extraction aborted: {}", e))?;
        serde_json::to_writer(&mut *out, &object).into_diagnostic()?;
        writeln!(out).into_diagnostic()?;
        out.flush().into_diagnostic()?;
        count += 1;
        debug!(count, "wrote extracted object");
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_run_writes_json_lines() {
        let input = concat!(
            r#"{"guiding_questions":["q"],"mangle_facts":[],"mangle_rules":[]}"#,
            r#"{"broken": }"#,
            "\n",
            r#"{"mangle_rules":["r(X) :- f(X)."],"mangle_facts":["f(1)."],"guiding_questions":[]}"#,
        );
        let mut out = Vec::new();

        let count = run(input.as_bytes(), 5, &mut out).await.unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            concat!(
                r#"{"guiding_questions":["q"],"mangle_facts":[],"mangle_rules":[]}"#,
                "\n",
                r#"{"guiding_questions":[],"mangle_facts":["f(1)."],"mangle_rules":["r(X) :- f(X)."]}"#,
                "\n",
            )
        );
    }

    #[tokio::test]
    async fn test_run_fails_on_invalid_utf8() {
        let mut out = Vec::new();
        let err = run(&b"{\"a\": \xff}"[..], 64, &mut out).await.unwrap_err();
        assert!(err.to_string().starts_with("extraction aborted"));
    }
}
