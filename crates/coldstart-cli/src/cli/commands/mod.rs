use std::path::Path;

use anyhow::Context;
use coldstart_core::report::{ci, console};
use coldstart_core::{LaunchResults, RunConfig, RunOutcome};

use super::args::*;
use crate::exit_codes::{self, EXIT_SUCCESS};

pub mod analyze;
pub mod collect;
pub mod run;
pub mod stop;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Run(args) => run::run(args).await,
        Command::Collect(args) => collect::run(args).await,
        Command::Analyze(args) => analyze::run(args),
        Command::Stop(args) => stop::run(args).await,
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(EXIT_SUCCESS)
        }
    }
}

/// Config file if present, defaults otherwise, then environment overrides.
pub(crate) fn load_config(path: &Path) -> anyhow::Result<RunConfig> {
    RunConfig::load_or_default(path)
        .with_context(|| format!("loading config {}", path.display()))
}

/// Launch counts for a session whose launches ran elsewhere.
pub(crate) fn external_launches(
    config: &RunConfig,
    target: Option<u32>,
    successful: Option<u32>,
) -> anyhow::Result<LaunchResults> {
    let target = target.unwrap_or(config.launch.target_launches);
    let successful = successful.unwrap_or(target);
    if successful > target {
        anyhow::bail!(
            "--successful-launches ({}) exceeds the target ({})",
            successful,
            target
        );
    }
    Ok(LaunchResults::from_counts(target, successful))
}

/// Console summary on stderr, CI lines on stdout (and optionally a file).
pub(crate) fn emit(outcome: &RunOutcome, output: &OutputArgs) -> anyhow::Result<i32> {
    console::print_summary(&outcome.report, Some(&outcome.report_path));

    let outputs = ci::ci_outputs(&outcome.report, &outcome.report_path);
    print!("{}", ci::format_lines(&outputs));
    if let Some(path) = &output.ci_output {
        ci::append_to_file(&outputs, path)
            .with_context(|| format!("writing CI outputs to {}", path.display()))?;
    }

    Ok(exit_codes::from_verdict(outcome.passed()))
}
