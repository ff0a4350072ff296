use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use storeaudit::config::PipelineConfig;
use storeaudit::pipeline::{check_table, run_pipeline};

#[derive(Parser)]
#[command(
    name = "storeaudit",
    version,
    about = "Validate, enhance and summarize retail sales data"
)]
pub struct Cli {
    /// Directory for rolling log files. Defaults to the platform data directory.
    #[arg(long, global = true, env = "STOREAUDIT_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Log to the console only
    #[arg(long, global = true)]
    pub no_log_file: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline: validate, enhance, summarize, export
    Run(RunArgs),
    /// Load and validate a file without writing anything
    Check {
        /// Path to the CSV file to check
        input: PathBuf,

        /// Field separator
        #[arg(short, long, default_value_t = ',')]
        delimiter: char,
    },
    /// Write a config file populated with the defaults
    InitConfig {
        /// Destination of the JSON config
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Clone)]
pub struct RunArgs {
    /// Input CSV. Overrides the config file.
    #[arg(short, long, env = "STOREAUDIT_INPUT")]
    pub input: Option<PathBuf>,

    /// Destination of the enhanced CSV. Overrides the config file.
    #[arg(short, long, env = "STOREAUDIT_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Destination of the text report. Overrides the config file.
    #[arg(short, long, env = "STOREAUDIT_REPORT")]
    pub report: Option<PathBuf>,

    /// Path to a JSON run configuration
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Field separator. Overrides the config file.
    #[arg(short, long)]
    pub delimiter: Option<char>,
}

impl RunArgs {
    /// Arguments for a bare `storeaudit` invocation: environment overrides only.
    pub fn from_env() -> Self {
        #[derive(Parser)]
        struct EnvOnly {
            #[command(flatten)]
            args: RunArgs,
        }
        EnvOnly::parse_from(["storeaudit"]).args
    }

    /// Config file (or defaults) with command-line overrides applied.
    pub fn resolve(self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => PipelineConfig::default(),
        };

        if let Some(input) = self.input {
            config.input = input;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(report) = self.report {
            config.report = report;
        }
        if let Some(delimiter) = self.delimiter {
            config.delimiter = delimiter;
        }
        Ok(config)
    }
}

pub fn run_command(command: Option<Commands>) -> Result<()> {
    match command {
        Some(Commands::Run(args)) => handle_run(args),
        None => handle_run(RunArgs::from_env()),
        Some(Commands::Check { input, delimiter }) => handle_check(&input, delimiter),
        Some(Commands::InitConfig { path, force }) => handle_init_config(&path, force),
    }
}

fn handle_run(args: RunArgs) -> Result<()> {
    let config = args.resolve()?;
    let run = run_pipeline(&config)?;

    println!("{}", run.summary());
    println!(
        "Final data: {} ({:.2} KB)",
        run.export.path.display(),
        run.export.size_kb()
    );
    match &run.report_path {
        Some(path) => println!("Report: {}", path.display()),
        None => println!("Report: not written (see log)"),
    }
    Ok(())
}

fn handle_check(input: &Path, delimiter: char) -> Result<()> {
    let config = PipelineConfig {
        delimiter,
        ..PipelineConfig::default()
    };
    let check = check_table(input, &config.load_options()?)?;

    println!(
        "{}: {} rows x {} columns ({})",
        check.path.display(),
        check.rows,
        check.columns,
        check.encoding
    );
    for finding in &check.validation.findings {
        println!("{finding}");
    }
    if check.validation.all_passed {
        println!("All checks passed");
    } else {
        println!("{} warning(s)", check.validation.warnings());
    }
    Ok(())
}

fn handle_init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    PipelineConfig::default().to_file(path)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
