//! The command line interface for the scheduler.
use crate::config::BatteryConfig;
use crate::input::{SERIES_FILE_NAME, read_series};
use crate::log;
use crate::model::build_model;
use crate::output::{create_output_directory, get_output_dir, write_schedule};
use crate::solver::HighsSolver;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// The command line interface for the scheduler.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Commands,
}

/// Options for the run command
#[derive(Args)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
    /// Wall-clock limit for the solver, in seconds
    #[arg(long)]
    pub time_limit: Option<f64>,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Compute the optimal schedule for a model.
    Run {
        /// Path to the model directory.
        model_dir: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Validate a model without solving it.
    Validate {
        /// Path to the model directory.
        model_dir: PathBuf,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { model_dir, opts } => handle_run_command(&model_dir, &opts),
            Self::Validate { model_dir } => handle_validate_command(&model_dir),
        }
    }
}

/// Parse CLI arguments and execute the chosen command
pub fn run_cli() -> Result<()> {
    Cli::parse().command.execute()
}

/// Handle the `run` command.
pub fn handle_run_command(model_path: &Path, opts: &RunOpts) -> Result<()> {
    let config =
        BatteryConfig::from_path(model_path).context("Failed to load battery configuration.")?;

    // Get path to output folder
    let pathbuf: PathBuf;
    let output_path = if let Some(p) = opts.output_dir.as_deref() {
        p
    } else {
        pathbuf = get_output_dir(model_path)?;
        &pathbuf
    };

    let overwritten = create_output_directory(output_path, opts.overwrite).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output_path.display()
        )
    })?;

    // Initialise program logger
    log::init(config.log_level.as_deref(), Some(output_path))
        .context("Failed to initialise logging.")?;

    info!("Loaded model from {}", model_path.display());
    info!("Output folder: {}", output_path.display());

    // NB: We have to wait until the logger is initialised to display this warning
    if overwritten {
        warn!("Output folder will be overwritten");
    }

    let series = read_series(&model_path.join(SERIES_FILE_NAME), config.horizon)
        .context("Failed to load time series.")?;
    let model = build_model(&config, &series).context("Failed to build model.")?;

    let solver = HighsSolver {
        time_limit: opts.time_limit,
    };
    let schedule = model.solve(&solver)?;
    info!(
        "Total revenue: {} ({} after rescaling)",
        schedule.revenue,
        schedule.scaled_revenue()
    );

    write_schedule(output_path, &schedule).context("Failed to write output.")?;
    info!("Schedule written to {}", output_path.display());

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(model_path: &Path) -> Result<()> {
    let config =
        BatteryConfig::from_path(model_path).context("Failed to load battery configuration.")?;

    // We won't save log files when running the validate command
    log::init(config.log_level.as_deref(), None).context("Failed to initialise logging.")?;

    let series = read_series(&model_path.join(SERIES_FILE_NAME), config.horizon)
        .context("Failed to load time series.")?;
    build_model(&config, &series).context("Failed to build model.")?;
    info!("Model validation successful!");

    Ok(())
}
