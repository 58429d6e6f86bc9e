use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use coldstart_core::CONFIG_FILE_NAME;

#[derive(Parser)]
#[command(
    name = "coldstart",
    version,
    about = "Cold-launch performance runs and session telemetry for remote device grids"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a device session, run cold launches, collect telemetry and report
    Run(RunArgs),
    /// Collect telemetry for an existing session and report
    Collect(CollectArgs),
    /// Evaluate a saved session snapshot offline
    Analyze(AnalyzeArgs),
    /// Stop a session on the grid
    Stop(StopArgs),
    Version,
}

/// Flags shared by every command that writes a report.
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Directory for the JSON report
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Also append key=value lines to this file (e.g. $GITHUB_OUTPUT)
    #[arg(long)]
    pub ci_output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(long, default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Override launch.target_launches
    #[arg(long)]
    pub target_launches: Option<u32>,

    /// Override app.package
    #[arg(long)]
    pub app_package: Option<String>,

    /// Override app.app_url
    #[arg(long)]
    pub app_url: Option<String>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug, Clone)]
pub struct CollectArgs {
    #[arg(long)]
    pub session_id: String,

    #[arg(long, default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Launches attempted outside this tool (defaults to launch.target_launches)
    #[arg(long)]
    pub target_launches: Option<u32>,

    /// Launches that reached the loaded marker (defaults to the target)
    #[arg(long)]
    pub successful_launches: Option<u32>,

    /// Do not ask the grid to stop the session first
    #[arg(long)]
    pub no_stop: bool,

    /// Fetch once instead of waiting for profiling data
    #[arg(long)]
    pub once: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Session snapshot JSON (the `session_data` section of a report)
    #[arg(long)]
    pub snapshot: PathBuf,

    #[arg(long, default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    #[arg(long)]
    pub target_launches: Option<u32>,

    #[arg(long)]
    pub successful_launches: Option<u32>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug, Clone)]
pub struct StopArgs {
    #[arg(long)]
    pub session_id: String,

    #[arg(long, default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,
}
