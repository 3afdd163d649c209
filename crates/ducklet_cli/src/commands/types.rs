//! Types command implementation.

use crate::error::CliResult;
use crate::output::OutputFormat;
use ducklet_core::LogicalType;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct TypeEntry {
    code: u32,
    name: &'static str,
}

/// Prints the logical type codes shared with the C ABI.
pub fn run(format: OutputFormat, out: &mut impl Write) -> CliResult<()> {
    let entries: Vec<TypeEntry> = LogicalType::all()
        .iter()
        .map(|t| TypeEntry {
            code: t.code(),
            name: t.name(),
        })
        .collect();

    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &entries)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            writeln!(out, "code,name")?;
            for entry in &entries {
                writeln!(out, "{},{}", entry.code, entry.name)?;
            }
        }
        OutputFormat::Text => {
            writeln!(out, "{:>4}  NAME", "CODE")?;
            for entry in &entries {
                writeln!(out, "{:>4}  {}", entry.code, entry.name)?;
            }
        }
    }
    Ok(())
}
