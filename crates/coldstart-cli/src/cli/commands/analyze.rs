use anyhow::Context;
use coldstart_core::{report_run, GridError, SessionSnapshot};

use super::{emit, external_launches, load_config};
use crate::cli::args::AnalyzeArgs;

pub fn run(args: AnalyzeArgs) -> anyhow::Result<i32> {
    let config = load_config(&args.config)?;
    let launches = external_launches(&config, args.target_launches, args.successful_launches)?;

    let snapshot = read_snapshot(&args.snapshot)
        .with_context(|| format!("reading snapshot {}", args.snapshot.display()))?;
    let session_id = snapshot.session_id.clone();

    let outcome = report_run(
        &config,
        &args.output.output_dir,
        &session_id,
        &launches,
        Some(snapshot),
    )?;

    emit(&outcome, &args.output)
}

fn read_snapshot(path: &std::path::Path) -> Result<SessionSnapshot, GridError> {
    let text = std::fs::read_to_string(path)?;
    let snapshot: SessionSnapshot = serde_json::from_str(&text)?;
    if snapshot.session_id.trim().is_empty() {
        return Err(GridError::Config {
            message: "snapshot has an empty session_id".to_string(),
        });
    }
    Ok(snapshot)
}
