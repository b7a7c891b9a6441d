//! Command-line arguments

use clap::{ArgAction, Parser};
use docdump_export::BinaryEncoding;
use std::path::PathBuf;

/// Export every table of a database to one JSON document file
#[derive(Parser, Debug, Default)]
#[command(
    name = "docdump",
    version,
    about = "Export every table of a database to one JSON document file",
    long_about = "Exports the tables of a relational database into a single JSON file: one \
array of row documents per table. Tables that cannot be read are skipped and reported; \
the run still succeeds."
)]
pub struct CliArgs {
    /// Database file or connection string (sqlite://path, sqlite:path, :memory:)
    #[arg(value_name = "DATABASE", env = "DOCDUMP_DATABASE")]
    pub database: Option<String>,

    /// Export only these tables (repeatable, comma-separated)
    #[arg(short = 't', long = "table", value_name = "TABLE", value_delimiter = ',')]
    pub tables: Vec<String>,

    /// Leave these tables out (repeatable, comma-separated)
    #[arg(short = 'x', long = "exclude", value_name = "TABLE", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Output file [default: <database>_export_<timestamp>.json]
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Directory for generated output file names
    #[arg(long, value_name = "DIR", conflicts_with = "output")]
    pub output_dir: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Binary column encoding: base64, hex or placeholder
    #[arg(long, value_name = "ENCODING")]
    pub binary: Option<BinaryEncoding>,

    /// Report BOOLEAN columns as true/false instead of 0/1
    #[arg(long)]
    pub typed_booleans: bool,

    /// Spaces per indentation level
    #[arg(long, value_name = "N")]
    pub indent: Option<usize>,

    /// Write compact single-line JSON
    #[arg(long, conflicts_with = "indent")]
    pub compact: bool,

    /// Also write JSON logs to daily files in this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    pub quiet: bool,
}
