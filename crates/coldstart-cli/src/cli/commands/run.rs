use anyhow::Context;
use coldstart_core::{PerformanceRun, SessionApiClient, WebDriverClient};
use tracing::info;

use super::{emit, load_config};
use crate::cli::args::RunArgs;

pub async fn run(args: RunArgs) -> anyhow::Result<i32> {
    let mut config = load_config(&args.config)?;
    if let Some(target) = args.target_launches {
        config.launch.target_launches = target;
    }
    if let Some(package) = args.app_package {
        config.app.package = package;
    }
    if let Some(app_url) = args.app_url {
        config.app.app_url = Some(app_url);
    }
    config.validate()?;

    let api = SessionApiClient::new(config.grid.clone())?;

    info!(
        app = %config.app.package,
        target_launches = config.launch.target_launches,
        "starting cold launch performance run"
    );
    // No report without a driver session.
    let driver = WebDriverClient::connect(&config.grid, &config.device, &config.app)
        .await
        .context("creating driver session")?;

    let outcome = PerformanceRun::new(&api, &config, &args.output.output_dir)
        .execute(driver)
        .await?;

    emit(&outcome, &args.output)
}
