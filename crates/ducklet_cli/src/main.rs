//! Ducklet CLI
//!
//! Command-line shell for Ducklet databases.
//!
//! # Commands
//!
//! - `query` - Run SQL statements and print their results
//! - `shell` - Interactive line-oriented SQL shell
//! - `types` - Print the logical type code table
//! - `version` - Show version information

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use ducklet_core::{AccessMode, Config, Database};
use output::OutputFormat;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Ducklet command-line SQL tools.
#[derive(Parser)]
#[command(name = "ducklet")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the database file (in-memory if omitted)
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Open the database read-only
    #[arg(global = true, long)]
    read_only: bool,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run SQL statements in order and print each result
    Query {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// SQL text; each argument may hold several `;`-separated statements
        #[arg(required = true)]
        sql: Vec<String>,
    },

    /// Start an interactive SQL shell on stdin
    Shell {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print the logical type codes
    Types {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show version information
    Version,
}

fn open(cli: &Cli) -> Result<Database, error::CliError> {
    let mut config = Config::new();
    if cli.read_only {
        config = config.access_mode(AccessMode::ReadOnly);
    }
    Ok(Database::open_with_config(cli.path.as_deref(), config)?)
}

fn run(cli: &Cli) -> error::CliResult<()> {
    let mut stdout = io::stdout().lock();
    match &cli.command {
        Commands::Query { format, sql } => {
            let db = open(cli)?;
            let conn = db.connect()?;
            commands::query::run(&conn, sql, *format, &mut stdout)?;
        }
        Commands::Shell { format } => {
            let db = open(cli)?;
            let conn = db.connect()?;
            let stdin = io::stdin();
            let prompt = stdin.is_terminal();
            commands::shell::Shell::new(&db, &conn, *format, prompt).run(
                stdin.lock(),
                &mut stdout,
                &mut io::stderr(),
            )?;
        }
        Commands::Types { format } => {
            commands::types::run(*format, &mut stdout)?;
        }
        Commands::Version => {
            println!("Ducklet CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Ducklet Core v{}", ducklet_core::VERSION);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_query_arguments() {
        let cli = Cli::try_parse_from(["ducklet", "query", "-f", "json", "SELECT 1", "SELECT 2"])
            .unwrap();
        match cli.command {
            Commands::Query { format, sql } => {
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(sql, vec!["SELECT 1".to_string(), "SELECT 2".to_string()]);
            }
            _ => panic!("expected query command"),
        }
        assert!(cli.path.is_none());
    }

    #[test]
    fn query_requires_sql() {
        assert!(Cli::try_parse_from(["ducklet", "query"]).is_err());
    }

    #[test]
    fn global_path_flag() {
        let cli = Cli::try_parse_from(["ducklet", "shell", "--path", "db.ducklet", "--read-only"])
            .unwrap();
        assert_eq!(cli.path, Some(PathBuf::from("db.ducklet")));
        assert!(cli.read_only);
    }
}
