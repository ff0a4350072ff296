//! # storeaudit - Retail Sales Validation and Insights
//!
//! storeaudit takes a retail sales table that was cleaned upstream, runs a
//! fixed battery of data-quality checks, adds derived columns, computes
//! descriptive business aggregates, and writes the enhanced table plus a
//! plain-text report.
//!
//! ## Quick Start
//!
//! ```no_run
//! use storeaudit::config::PipelineConfig;
//! use storeaudit::pipeline::run_pipeline;
//!
//! let run = run_pipeline(&PipelineConfig::default())?;
//! println!("validation passed: {}", run.validation_passed);
//! # Ok::<(), storeaudit::error::StoreAuditError>(())
//! ```
//!
//! ## Core Modules
//!
//! - [`pipeline`]: loader, validator, enhancer, insights, exporter and the driver
//! - [`table`]: column names and typed access to the Polars `DataFrame`
//! - [`config`]: JSON run configuration
//! - [`error`]: error types and handling utilities
//! - [`logging`]: console and rolling-file tracing setup
//! - [`utils`]: number formatting for the report
//!
//! ## Stage Composition
//!
//! Each stage can also be run on its own against an in-memory frame:
//!
//! ```no_run
//! use storeaudit::pipeline::{enhance, validate};
//! use polars::prelude::*;
//!
//! let mut df = df!(
//!     "Order Date" => ["2016-11-08"],
//!     "Sales" => [261.96],
//!     "Profit" => [41.91]
//! )?;
//! let outcome = validate(&df);
//! let added = enhance(&mut df)?;
//! println!("{} findings, {} columns added", outcome.findings.len(), added.added().len());
//! # Ok::<(), storeaudit::error::StoreAuditError>(())
//! ```

#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod table;
pub mod utils;
