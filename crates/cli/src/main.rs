// ttrack - training compliance reconciliation CLI

mod exit_codes;
mod outputs;
mod validate;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use ttrack_compliance::{TrackerError, TrackerInput, ValidationIssue};
use ttrack_config::{ConfigError, Settings};

use exit_codes::*;

#[derive(Parser)]
#[command(name = "ttrack")]
#[command(about = "Reconcile an HR roster, role requirements and a training status feed into compliance KPIs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Input root holding hr/ and organizations/ (overrides config and TRAINING_TRACKER_INPUT_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    input_dir: Option<PathBuf>,

    /// Output directory (overrides config and TRAINING_TRACKER_OUTPUT_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Settings file (default: ./ttrack.toml when present)
    #[arg(long, global = true, value_name = "FILE", env = "TTRACK_CONFIG")]
    config: Option<PathBuf>,

    /// Log pipeline stages to stderr (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the inputs and report validation issues
    #[command(after_help = "\
Exit codes:
  0  no ERROR-level issues (warnings may be listed)
  1  at least one ERROR-level issue
  3  inputs missing or malformed")]
    Validate {
        /// Emit a single JSON object on stdout
        #[arg(long)]
        json: bool,
    },

    /// Validate, compute every KPI table and write the output workbook
    #[command(after_help = "\
On ERROR-level issues the workbook is not written; validation_issues.csv is
written to the output directory instead and the command exits 1.")]
    BuildOutputs {
        /// Emit a single JSON summary on stdout
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = resolve_settings(&cli).and_then(|settings| match cli.command {
        Commands::Validate { json } => validate::cmd_validate(&settings, json),
        Commands::BuildOutputs { json } => outputs::cmd_build_outputs(&settings, json),
    });

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn resolve_settings(cli: &Cli) -> Result<Settings, CliError> {
    let settings = Settings::load(cli.config.as_deref()).map_err(CliError::config)?;
    Ok(settings.with_overrides(cli.input_dir.clone(), cli.output_dir.clone()))
}

/// Load all input tables. Schema errors carry their issue form so callers
/// can report them like any other validation finding.
fn load_input(input_dir: &Path) -> Result<TrackerInput, (CliError, Option<ValidationIssue>)> {
    ttrack_io::load_input(input_dir).map_err(|err| {
        let issue = ValidationIssue::from_error(&err);
        (CliError::input(err, input_dir), issue)
    })
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    /// Validation found ERROR-level issues; they were already printed.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self { code: EXIT_VALIDATION, message: msg.into(), hint: None }
    }

    pub fn config(err: ConfigError) -> Self {
        Self { code: EXIT_USAGE, message: err.to_string(), hint: None }
    }

    /// Loader failure, with a hint pointing at the expected layout.
    pub fn input(err: TrackerError, input_dir: &Path) -> Self {
        let hint = match &err {
            TrackerError::NoInputFiles { .. } => Some(format!(
                "expected hr/Associates_List.xlsx and organizations/<org>/{{Roles,Status}}/ under {}; \
                 set --input-dir or TRAINING_TRACKER_INPUT_DIR",
                input_dir.display()
            )),
            TrackerError::UnknownRequiredType { .. } => {
                Some("accepted 'Required' values: Mandatory, Obligatorio, Optional, NA".to_string())
            }
            _ => None,
        };
        Self { code: EXIT_INPUT, message: err.to_string(), hint }
    }

    pub fn output(msg: impl Into<String>) -> Self {
        Self { code: EXIT_OUTPUT, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
