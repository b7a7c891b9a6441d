//! Run settings: command-line arguments merged over an optional TOML file

use docdump_export::BinaryEncoding;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::args::CliArgs;
use crate::logging::LoggingConfig;

const DEFAULT_INDENT: usize = 2;
const MAX_INDENT: usize = 16;
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{0}")]
    Invalid(String),
}

/// Contents of a config file. Every key is optional.
///
/// ```toml
/// database = "shop.db"
/// tables = ["customers", "orders"]
/// exclude = ["audit_log"]
/// output_dir = "exports"
///
/// [format]
/// indent = 4
/// binary = "hex"
/// typed_booleans = true
///
/// [logging]
/// level = "debug"
/// log_dir = "logs"
/// ```
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub database: Option<String>,
    pub tables: Vec<String>,
    pub exclude: Vec<String>,
    pub output: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub format: FormatSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatSection {
    pub indent: Option<usize>,
    pub binary: Option<BinaryEncoding>,
    pub typed_booleans: Option<bool>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    pub level: Option<String>,
    pub log_dir: Option<PathBuf>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Fully resolved settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database: String,
    /// `None` exports every discovered table
    pub tables: Option<Vec<String>>,
    pub exclude: Vec<String>,
    pub output: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub indent: usize,
    pub binary: BinaryEncoding,
    pub typed_booleans: bool,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Read the config file named by `args` (if any) and merge.
    pub fn load(args: &CliArgs) -> Result<Self, ConfigError> {
        let file = match &args.config_file {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(args, file)
    }

    /// Merge command-line values over `file` and validate the result.
    pub fn resolve(args: &CliArgs, file: FileConfig) -> Result<Self, ConfigError> {
        let database = args
            .database
            .clone()
            .or(file.database)
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .ok_or_else(|| {
                ConfigError::Invalid(
                    "no database given (pass DATABASE, set DOCDUMP_DATABASE or `database` in the config file)"
                        .into(),
                )
            })?;

        let tables = if !args.tables.is_empty() {
            Some(args.tables.clone())
        } else if !file.tables.is_empty() {
            Some(file.tables)
        } else {
            None
        };

        let exclude = if args.exclude.is_empty() {
            file.exclude
        } else {
            args.exclude.clone()
        };

        // An explicit output file on the command line also beats a configured
        // output directory, and vice versa.
        let (output, output_dir) = match (&args.output, &args.output_dir) {
            (Some(output), _) => (Some(output.clone()), None),
            (None, Some(dir)) => (None, Some(dir.clone())),
            (None, None) => (file.output, file.output_dir),
        };

        let indent = if args.compact {
            0
        } else {
            args.indent.or(file.format.indent).unwrap_or(DEFAULT_INDENT)
        };

        let level = if args.quiet {
            "warn".to_string()
        } else {
            match args.verbose {
                0 => file.logging.level.unwrap_or_else(|| "info".to_string()),
                1 => "debug".to_string(),
                _ => "trace".to_string(),
            }
        };

        let settings = Settings {
            database,
            tables,
            exclude,
            output,
            output_dir,
            indent,
            binary: args.binary.or(file.format.binary).unwrap_or_default(),
            typed_booleans: args.typed_booleans || file.format.typed_booleans.unwrap_or(false),
            logging: LoggingConfig {
                level: level.to_ascii_lowercase(),
                log_dir: args.log_dir.clone().or(file.logging.log_dir),
                ..LoggingConfig::default()
            },
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.indent > MAX_INDENT {
            return Err(ConfigError::Invalid(format!(
                "indent must be at most {}, got {}",
                MAX_INDENT, self.indent
            )));
        }
        let names = self.tables.iter().flatten().chain(&self.exclude);
        for name in names {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid("table names must not be empty".into()));
            }
        }
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "unknown log level '{}' (expected one of {})",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }
}
