//! Query command implementation.

use crate::error::CliResult;
use crate::output::{write_result, OutputFormat};
use ducklet_core::Connection;
use std::io::Write;
use tracing::debug;

/// Runs each statement batch in order and prints every result.
///
/// Stops at the first failing batch.
pub fn run(
    conn: &Connection,
    statements: &[String],
    format: OutputFormat,
    out: &mut impl Write,
) -> CliResult<()> {
    for (i, sql) in statements.iter().enumerate() {
        debug!(index = i, "running statement batch");
        let result = conn.query(sql)?;
        write_result(out, &result, format)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use ducklet_core::{Database, ErrorKind};

    #[test]
    fn runs_batches_in_order() {
        let db = Database::open(None).unwrap();
        let conn = db.connect().unwrap();
        let statements = vec![
            "CREATE TABLE t (x INTEGER)".to_string(),
            "INSERT INTO t VALUES (3), (1), (2)".to_string(),
            "SELECT x FROM t ORDER BY x".to_string(),
        ];
        let mut out = Vec::new();
        run(&conn, &statements, OutputFormat::Csv, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "Count\n3\nx\n1\n2\n3\n");
    }

    #[test]
    fn stops_at_first_error() {
        let db = Database::open(None).unwrap();
        let conn = db.connect().unwrap();
        let statements = vec!["SELECT nope".to_string(), "SELECT 1".to_string()];
        let mut out = Vec::new();
        let err = run(&conn, &statements, OutputFormat::Text, &mut out).unwrap_err();
        match err {
            CliError::Core(e) => assert_eq!(e.kind(), ErrorKind::Query),
            other => panic!("unexpected error: {other}"),
        }
        assert!(out.is_empty());
    }
}
