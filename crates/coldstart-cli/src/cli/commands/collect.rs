use coldstart_core::{GridError, PerformanceRun, PollPolicy, SessionApiClient};

use super::{emit, external_launches, load_config};
use crate::cli::args::CollectArgs;

pub async fn run(args: CollectArgs) -> anyhow::Result<i32> {
    if args.session_id.trim().is_empty() {
        return Err(GridError::Config {
            message: "--session-id must not be empty".to_string(),
        }
        .into());
    }
    let mut config = load_config(&args.config)?;
    config.grid.validate()?;
    let launches = external_launches(&config, args.target_launches, args.successful_launches)?;

    if args.once {
        config.polling = PollPolicy::immediate(1);
    }

    let api = SessionApiClient::new(config.grid.clone())?;
    let run = PerformanceRun::new(&api, &config, &args.output.output_dir);

    let outcome = if args.no_stop {
        let poll =
            coldstart_core::poll_for_profiling(&api, &args.session_id, &config.polling).await;
        run.finish(&args.session_id, &launches, poll.snapshot)?
    } else {
        run.collect(&args.session_id, launches).await?
    };

    emit(&outcome, &args.output)
}
