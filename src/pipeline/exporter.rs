//! Writes the enhanced table and the text report.

use crate::error::{Result, StoreAuditError};
use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

/// What ended up on disk after a successful table export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub rows: usize,
    pub columns: usize,
    pub bytes: u64,
}

impl ExportSummary {
    pub fn size_kb(&self) -> f64 {
        self.bytes as f64 / 1024.0
    }
}

fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Writes `df` as UTF-8 CSV with a header row, creating parent directories.
///
/// # Errors
///
/// Returns [`StoreAuditError::Export`] on any I/O or serialization failure.
pub fn export_table(df: &mut DataFrame, path: &Path) -> Result<ExportSummary> {
    tracing::info!("Exporting final cleaned data to {}", path.display());
    let fail = |reason: String| StoreAuditError::export(path, reason);

    ensure_parent_dir(path).map_err(|e| fail(format!("cannot create directory: {e}")))?;

    let file = File::create(path).map_err(|e| fail(format!("cannot create file: {e}")))?;
    let mut writer = BufWriter::new(file);
    CsvWriter::new(&mut writer)
        .include_header(true)
        .finish(df)
        .map_err(|e| fail(format!("cannot write CSV: {e}")))?;
    writer
        .flush()
        .map_err(|e| fail(format!("cannot flush CSV: {e}")))?;

    let bytes = std::fs::metadata(path)
        .map_err(|e| fail(format!("cannot stat output: {e}")))?
        .len();

    let summary = ExportSummary {
        path: path.to_path_buf(),
        rows: df.height(),
        columns: df.width(),
        bytes,
    };

    let location = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    tracing::info!(
        rows = summary.rows,
        columns = summary.columns,
        "Exported {} rows x {} columns ({:.2} KB) to {}",
        summary.rows,
        summary.columns,
        summary.size_kb(),
        location.display()
    );

    Ok(summary)
}

/// Writes the rendered report, creating parent directories.
///
/// # Errors
///
/// Returns [`StoreAuditError::ReportWrite`] on I/O failure.
pub fn write_report(path: &Path, contents: &str) -> Result<()> {
    let fail = |e: std::io::Error| StoreAuditError::report_write(path, e.to_string());

    ensure_parent_dir(path).map_err(fail)?;
    std::fs::write(path, contents).map_err(fail)?;

    tracing::info!("Validation report saved: {}", path.display());
    Ok(())
}
