//! docdump: export every table of a database to one JSON document file

mod args;
mod config;
mod logging;
mod report;

use clap::Parser;
use docdump_drivers::DriverRegistry;
use docdump_export::{
    DocumentWriter, ExportError, ExportOptions, ExportPhase, ExportProgress, ExportReport,
    ExportRequest, NormalizeOptions,
};
use std::process::ExitCode;
use thiserror::Error;

use crate::args::CliArgs;
use crate::config::{ConfigError, Settings};

/// Why a run ended without an output file
#[derive(Debug, Error)]
enum Failure {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to initialize logging: {0:#}")]
    Logging(anyhow::Error),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl Failure {
    /// `1` for connection and write failures, `2` for invalid configuration
    fn exit_code(&self) -> u8 {
        match self {
            Failure::Config(_) | Failure::Export(ExportError::Configuration(_)) => 2,
            Failure::Logging(_) | Failure::Export(_) => 1,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    match run(args).await {
        Ok(report) => {
            print!("{}", report::render(&report));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(args: CliArgs) -> Result<ExportReport, Failure> {
    let settings = Settings::load(&args)?;
    let _log_guard = logging::init(&settings.logging).map_err(Failure::Logging)?;

    let registry = DriverRegistry::with_defaults();
    let (driver, config) = registry.resolve(&settings.database).map_err(ExportError::from)?;
    // The exporter never writes to the store, and a missing file must not be
    // created as an empty database.
    let config = config
        .with_param("read_only", true)
        .with_param("typed_booleans", settings.typed_booleans);

    tracing::info!(
        driver = driver.id(),
        database = %settings.database,
        "starting export"
    );

    let source = config
        .get_string("path")
        .unwrap_or_else(|| settings.database.clone());
    let mut writer = DocumentWriter::new(&source).with_indent(settings.indent);
    if let Some(dir) = &settings.output_dir {
        writer = writer.with_output_dir(dir);
    }

    let options = ExportOptions::default()
        .with_exclude(settings.exclude.clone())
        .with_normalize(NormalizeOptions::default().with_binary(settings.binary));

    let mut request = ExportRequest::new(writer)
        .with_options(options)
        .with_progress(Box::new(log_progress));
    if let Some(tables) = settings.tables.clone() {
        request = request.with_tables(tables);
    }
    if let Some(output) = &settings.output {
        request = request.with_output(output);
    }

    let report = docdump_export::run(driver.as_ref(), &config, request).await?;
    Ok(report)
}

fn log_progress(progress: ExportProgress) {
    let message = progress.message.unwrap_or_default();
    match progress.phase {
        ExportPhase::TableExported => tracing::info!(
            table = progress.current_table.as_deref().unwrap_or_default(),
            rows = progress.rows_exported,
            done = progress.tables_completed,
            total = progress.total_tables,
            "{}",
            message
        ),
        ExportPhase::TableSkipped => tracing::warn!(
            table = progress.current_table.as_deref().unwrap_or_default(),
            "{}",
            message
        ),
        ExportPhase::Complete => tracing::info!("{}", message),
        _ => tracing::debug!("{}", message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            Failure::Config(ConfigError::Invalid("x".into())).exit_code(),
            2
        );
        assert_eq!(
            Failure::Export(ExportError::Configuration("bad scheme".into())).exit_code(),
            2
        );
        assert_eq!(
            Failure::Export(ExportError::Connection("gone".into())).exit_code(),
            1
        );
        assert_eq!(
            Failure::Export(ExportError::Write {
                path: "out.json".into(),
                message: "disk full".into(),
            })
            .exit_code(),
            1
        );
    }
}
