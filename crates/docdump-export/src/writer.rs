//! Document writer
//!
//! Serializes an [`ExportResult`] to a single JSON file. The file only
//! appears once it is complete: the JSON is written to a temporary file next
//! to the destination, flushed to disk and then renamed over it.

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{ExportError, ExportResult};

const DEFAULT_INDENT: usize = 2;

/// Writes export results as JSON files
#[derive(Debug, Clone)]
pub struct DocumentWriter {
    source_stem: String,
    indent: usize,
    output_dir: Option<PathBuf>,
}

impl DocumentWriter {
    /// Create a writer for exports of `source` (a database path or `:memory:`)
    pub fn new(source: &str) -> Self {
        Self {
            source_stem: source_stem(source),
            indent: DEFAULT_INDENT,
            output_dir: None,
        }
    }

    /// Spaces per indentation level; `0` writes compact single-line JSON
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Directory for files with a generated name
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn indent(&self) -> usize {
        self.indent
    }

    /// `<source stem>_export_<YYYYMMDD_HHMMSS>.json`.
    ///
    /// Two exports of the same source within one second get the same name.
    pub fn default_file_name(&self, at: DateTime<Local>) -> String {
        format!(
            "{}_export_{}.json",
            self.source_stem,
            at.format("%Y%m%d_%H%M%S")
        )
    }

    /// Serialize `result` to the bytes that [`write`](Self::write) stores
    pub fn render(&self, result: &ExportResult) -> Result<Vec<u8>, ExportError> {
        let mut buf = Vec::new();
        let serialized = if self.indent == 0 {
            serde_json::to_writer(&mut buf, result)
        } else {
            let indent = " ".repeat(self.indent);
            let mut serializer =
                Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(indent.as_bytes()));
            result.serialize(&mut serializer)
        };
        serialized.map_err(|e| ExportError::write("<memory>", format!("serialization failed: {}", e)))?;
        buf.push(b'\n');
        Ok(buf)
    }

    /// Write `result` to `output`, or to a generated file name when `None`.
    ///
    /// An explicit path must point into an existing directory. The output
    /// directory for generated names is created when missing.
    #[tracing::instrument(skip(self, result), fields(tables = result.len()))]
    pub fn write(&self, result: &ExportResult, output: Option<&Path>) -> Result<PathBuf, ExportError> {
        let path = match output {
            Some(path) => path.to_path_buf(),
            None => {
                let dir = self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
                if !dir.is_dir() {
                    std::fs::create_dir_all(&dir).map_err(|e| ExportError::write(&dir, e))?;
                }
                dir.join(self.default_file_name(Local::now()))
            }
        };

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !parent.is_dir() {
            return Err(ExportError::write(
                &path,
                format!("directory '{}' does not exist", parent.display()),
            ));
        }

        let bytes = self.render(result)?;

        let mut temp = tempfile::Builder::new()
            .prefix(".docdump-")
            .suffix(".json.tmp")
            .tempfile_in(&parent)
            .map_err(|e| ExportError::write(&path, e))?;
        temp.write_all(&bytes)
            .map_err(|e| ExportError::write(&path, e))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| ExportError::write(&path, e))?;
        temp.persist(&path)
            .map_err(|e| ExportError::write(&path, e.error))?;

        tracing::info!(path = %path.display(), bytes = bytes.len(), "export written");
        Ok(path)
    }
}

fn source_stem(source: &str) -> String {
    if source == ":memory:" {
        return "memory".to_string();
    }
    Path::new(source)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "database".to_string())
}
