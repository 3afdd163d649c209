//! Interactive shell implementation.
//!
//! Input is read line by line. A statement runs once a line ends with `;`.
//! Lines starting with `.` are shell commands and run immediately.

use crate::error::CliResult;
use crate::output::{write_result, OutputFormat};
use ducklet_core::{Connection, Database};
use std::io::{BufRead, Write};

const PROMPT: &str = "ducklet> ";
const CONTINUATION: &str = "    ...> ";

const HELP: &str = "\
.help            Show this message
.tables          List tables
.mode FORMAT     Set output format (text, json, csv)
.stats           Show query and connection counters
.quit, .exit     Leave the shell
";

/// Shell state: the open database, one connection and the output mode.
pub struct Shell<'a> {
    db: &'a Database,
    conn: &'a Connection,
    format: OutputFormat,
    prompt: bool,
}

enum Flow {
    Continue,
    Quit,
}

impl<'a> Shell<'a> {
    /// Creates a shell. `prompt` controls whether prompts are printed.
    pub fn new(db: &'a Database, conn: &'a Connection, format: OutputFormat, prompt: bool) -> Self {
        Self {
            db,
            conn,
            format,
            prompt,
        }
    }

    /// Reads statements from `input` until end of input or `.quit`.
    ///
    /// Statement errors go to `err` and the session continues.
    pub fn run(
        &mut self,
        input: impl BufRead,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> CliResult<()> {
        let mut buffer = String::new();
        self.show_prompt(out, &buffer)?;

        for line in input.lines() {
            let line = line?;
            let trimmed = line.trim();

            if buffer.is_empty() && trimmed.starts_with('.') {
                if let Flow::Quit = self.command(trimmed, out, err)? {
                    return Ok(());
                }
            } else if !trimmed.is_empty() {
                buffer.push_str(&line);
                buffer.push('\n');
                if trimmed.ends_with(';') {
                    self.execute(&buffer, out, err)?;
                    buffer.clear();
                }
            }
            self.show_prompt(out, &buffer)?;
        }

        // Run an unterminated trailing statement
        if !buffer.trim().is_empty() {
            self.execute(&buffer, out, err)?;
        }
        Ok(())
    }

    fn show_prompt(&self, out: &mut impl Write, buffer: &str) -> CliResult<()> {
        if self.prompt {
            let prompt = if buffer.is_empty() { PROMPT } else { CONTINUATION };
            out.write_all(prompt.as_bytes())?;
            out.flush()?;
        }
        Ok(())
    }

    fn execute(&self, sql: &str, out: &mut impl Write, err: &mut impl Write) -> CliResult<()> {
        match self.conn.query(sql) {
            Ok(result) => write_result(out, &result, self.format),
            Err(e) => {
                writeln!(err, "Error: {}: {e}", e.kind())?;
                Ok(())
            }
        }
    }

    fn command(
        &mut self,
        line: &str,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> CliResult<Flow> {
        let mut parts = line.split_whitespace();
        match (parts.next().unwrap_or_default(), parts.next()) {
            (".quit" | ".exit", _) => return Ok(Flow::Quit),
            (".help", _) => out.write_all(HELP.as_bytes())?,
            (".tables", _) => {
                for name in self.db.table_names() {
                    writeln!(out, "{name}")?;
                }
            }
            (".mode", Some(mode)) => match mode {
                "text" => self.format = OutputFormat::Text,
                "json" => self.format = OutputFormat::Json,
                "csv" => self.format = OutputFormat::Csv,
                other => writeln!(err, "Error: unknown mode '{other}'")?,
            },
            (".stats", _) => {
                let stats = self.db.stats();
                writeln!(out, "queries executed: {}", stats.queries_executed)?;
                writeln!(out, "queries failed:   {}", stats.queries_failed)?;
                writeln!(out, "rows produced:    {}", stats.rows_produced)?;
                writeln!(out, "connections:      {}", stats.live_connections())?;
            }
            (other, _) => writeln!(err, "Error: unknown command '{other}', try .help")?,
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(input: &str) -> (String, String) {
        let db = Database::open(None).unwrap();
        let conn = db.connect().unwrap();
        let mut out = Vec::new();
        let mut err = Vec::new();
        Shell::new(&db, &conn, OutputFormat::Csv, false)
            .run(input.as_bytes(), &mut out, &mut err)
            .unwrap();
        (String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
    }

    #[test]
    fn multi_line_statements() {
        let (out, err) = session(
            "CREATE TABLE t (x INTEGER);\nINSERT INTO t\n  VALUES (1), (2);\nSELECT x\nFROM t\nORDER BY x DESC;\n",
        );
        assert_eq!(out, "Count\n2\nx\n2\n1\n");
        assert!(err.is_empty());
    }

    #[test]
    fn errors_do_not_end_the_session() {
        let (out, err) = session("SELECT nope;\nSELECT 1 AS one;\n");
        assert!(err.starts_with("Error: QueryError:"));
        assert_eq!(out, "one\n1\n");
    }

    #[test]
    fn dot_commands() {
        let (out, err) = session(
            "CREATE TABLE b (x INTEGER);\nCREATE TABLE a (x INTEGER);\n.tables\n.mode json\n.bogus\n.quit\nSELECT 1;\n",
        );
        assert_eq!(out, "a\nb\n");
        assert!(err.contains("unknown command '.bogus'"));
    }

    #[test]
    fn trailing_statement_without_semicolon() {
        let (out, _) = session("SELECT 7 AS n");
        assert_eq!(out, "n\n7\n");
    }

    #[test]
    fn prompts_are_written_when_enabled() {
        let db = Database::open(None).unwrap();
        let conn = db.connect().unwrap();
        let mut out = Vec::new();
        let mut err = Vec::new();
        Shell::new(&db, &conn, OutputFormat::Csv, true)
            .run("SELECT\n1;\n".as_bytes(), &mut out, &mut err)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with(PROMPT));
        assert!(text.contains(CONTINUATION));
    }
}
