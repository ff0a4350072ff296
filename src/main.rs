//! # storeaudit command-line entry point
//!
//! ```text
//! main()
//!   │
//!   ├─> Parse CLI arguments (clap)
//!   ├─> Initialize logging (console + rolling files)
//!   └─> Dispatch: run (default) | check | init-config
//! ```
//!
//! ```bash
//! storeaudit                                  # run with defaults
//! storeaudit run -i in.csv -o out.csv
//! storeaudit check data/superstore.csv
//! storeaudit init-config storeaudit.json
//! ```
//!
//! Exit status is 0 on success and 1 on any load, export or config failure.
//! Validation warnings never change the exit status.

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout, clippy::print_stderr)] // The binary talks to the terminal

mod cli;

use clap::Parser as _;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    if let Err(e) = storeaudit::logging::init(cli.log_dir.as_deref(), !cli.no_log_file) {
        eprintln!("Warning: file logging unavailable: {e:#}");
        if let Err(e) = storeaudit::logging::init(None, false) {
            eprintln!("Warning: logging unavailable: {e:#}");
        }
    }

    match cli::run_command(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
