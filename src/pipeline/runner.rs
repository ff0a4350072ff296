//! End-to-end driver.
//!
//! Executes the stages strictly in sequence over one owned table:
//! load, validate, enhance, insights, export, report.

use super::enhancer::{EnhancementReport, enhance};
use super::exporter::{ExportSummary, export_table, write_report};
use super::insights::generate_insights;
use super::loader::{LoadOptions, LoadedTable, SourceEncoding, load_table};
use super::report::{ReportBuilder, ReportContext};
use super::validator::{ValidationOutcome, validate};
use crate::config::PipelineConfig;
use crate::error::Result;
use chrono::Local;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Rows in the exported table
    pub rows: usize,

    /// Columns in the exported table, derived ones included
    pub columns: usize,

    /// True iff no validation check produced a warning
    pub validation_passed: bool,

    /// Number of validation warnings
    pub warnings: usize,

    /// What the enhancer added or skipped
    pub enhancements: EnhancementReport,

    pub export: ExportSummary,

    /// `None` when writing the report failed; the run still counts as a success
    pub report_path: Option<PathBuf>,

    pub duration: Duration,
}

impl RunReport {
    pub fn summary(&self) -> String {
        format!(
            "Pipeline completed: {} rows, {} columns ({} added), validation {} ({} warnings), {:.2}s",
            self.rows,
            self.columns,
            self.enhancements.added().len(),
            if self.validation_passed {
                "passed"
            } else {
                "flagged issues"
            },
            self.warnings,
            self.duration.as_secs_f64()
        )
    }
}

/// Outcome of a load-and-validate pass with no writes.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub path: PathBuf,
    pub rows: usize,
    pub columns: usize,
    pub encoding: SourceEncoding,
    pub validation: ValidationOutcome,
}

fn stage(name: &str) {
    tracing::info!("{}", "=".repeat(70));
    tracing::info!("{name}");
    tracing::info!("{}", "=".repeat(70));
}

/// Logs a failed non-fatal stage and continues with an empty result.
fn recover<T: Default>(name: &str, result: Result<T>) -> T {
    result.unwrap_or_else(|e| {
        tracing::error!("{name} failed, continuing without it: {e}");
        T::default()
    })
}

/// Runs the full pipeline described by `config`.
///
/// # Errors
///
/// Load and export failures abort the run. Enhancement and insight
/// failures are logged and the run continues with what was built. A report
/// write failure is logged and reflected as `report_path: None`.
pub fn run_pipeline(config: &PipelineConfig) -> Result<RunReport> {
    let start = Instant::now();
    let options = config.load_options()?;

    stage("LOADING DATA");
    let LoadedTable { mut frame, .. } = load_table(&config.input, &options)?;

    let mut report = ReportBuilder::new();

    stage("VALIDATING DATA");
    let validation = validate(&frame);
    report.record_validation(&validation);

    stage("ENHANCING DATA");
    let enhancements = recover("Enhancement", enhance(&mut frame));

    stage("GENERATING INSIGHTS");
    report.record_insights(recover("Insight generation", generate_insights(&frame)));

    stage("EXPORTING DATA");
    let export = export_table(&mut frame, &config.output)?;

    let text = report.render(&ReportContext {
        input: &config.input,
        output: &config.output,
        rows: frame.height(),
        columns: frame.width(),
        generated_at: Local::now(),
    });
    let report_path = match write_report(&config.report, &text) {
        Ok(()) => Some(config.report.clone()),
        Err(e) => {
            tracing::error!("{e}");
            None
        }
    };

    let run = RunReport {
        rows: frame.height(),
        columns: frame.width(),
        validation_passed: validation.all_passed,
        warnings: validation.warnings(),
        enhancements,
        export,
        report_path,
        duration: start.elapsed(),
    };
    tracing::info!("{}", run.summary());
    Ok(run)
}

/// Loads and validates `path` without enhancing or writing anything.
///
/// # Errors
///
/// Returns the loader's error if the file cannot be read or decoded.
pub fn check_table(path: &Path, options: &LoadOptions) -> Result<CheckReport> {
    stage("LOADING DATA");
    let loaded = load_table(path, options)?;

    stage("VALIDATING DATA");
    let validation = validate(&loaded.frame);

    Ok(CheckReport {
        path: loaded.path,
        rows: loaded.frame.height(),
        columns: loaded.frame.width(),
        encoding: loaded.encoding,
        validation,
    })
}
