//! The validation, enhancement and insight pipeline.
//!
//! # Overview
//!
//! Stages run strictly forward over one owned `DataFrame`:
//! - **Loader**: decode and parse the delimited input ([`loader`])
//! - **Validator**: six column-gated data-quality checks ([`validator`])
//! - **Enhancer**: idempotent derived columns ([`enhancer`])
//! - **Insights**: descriptive aggregates as report lines ([`insights`])
//! - **Exporter**: the enhanced CSV and the text report ([`exporter`], [`report`])
//!
//! Checks, enhancements and insight groups are declared as tables of rules
//! gated on the columns they need ([`rules`]); a missing column disables
//! exactly the rules that depend on it.
//!
//! # Example
//!
//! ```no_run
//! use storeaudit::config::PipelineConfig;
//! use storeaudit::pipeline::run_pipeline;
//!
//! let config = PipelineConfig::from_file("storeaudit.json")?;
//! let run = run_pipeline(&config)?;
//! println!("{}", run.summary());
//! # Ok::<(), storeaudit::error::StoreAuditError>(())
//! ```

pub mod enhancer;
pub mod exporter;
pub mod insights;
pub mod loader;
pub mod report;
pub mod rules;
pub mod runner;
pub mod validator;

pub use enhancer::{EnhancementReport, EnhancementStatus, enhance};
pub use exporter::{ExportSummary, export_table, write_report};
pub use insights::{InsightGroup, InsightLine, InsightSection, generate_insights};
pub use loader::{LoadOptions, LoadedTable, SourceEncoding, load_table};
pub use report::{ReportBuilder, ReportContext};
pub use runner::{CheckReport, RunReport, check_table, run_pipeline};
pub use validator::{ValidationFinding, ValidationOutcome, validate};
