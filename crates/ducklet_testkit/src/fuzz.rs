//! Fuzz testing harnesses for Ducklet.
//!
//! These targets can be driven by cargo-fuzz or by proptest. Each one
//! accepts arbitrary bytes and must never panic: malformed input has to
//! surface as an error value.

use ducklet_core::{sql, Database};

/// Fuzz target for the SQL parser.
pub fn fuzz_parse(data: &[u8]) {
    let text = String::from_utf8_lossy(data);
    let _ = sql::parse(&text);
}

/// Fuzz target for statement execution on a prepared table.
///
/// Failures are expected; only panics are bugs.
pub fn fuzz_execute(data: &[u8]) {
    let Ok(db) = Database::open(None) else {
        return;
    };
    let Ok(conn) = db.connect() else {
        return;
    };
    if conn
        .query("CREATE TABLE t (a INTEGER, b VARCHAR, c DOUBLE); INSERT INTO t VALUES (1, 'x', 0.5), (NULL, NULL, NULL)")
        .is_err()
    {
        return;
    }

    let text = String::from_utf8_lossy(data);
    let _ = conn.query(&text);

    // The connection must stay usable after any failure
    assert!(conn.query("SELECT 1").is_ok(), "connection broken by: {text}");
}
