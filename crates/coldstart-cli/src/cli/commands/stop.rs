use coldstart_core::{SessionApi, SessionApiClient};

use super::load_config;
use crate::cli::args::StopArgs;
use crate::exit_codes::{EXIT_INFRA_ERROR, EXIT_SUCCESS};

pub async fn run(args: StopArgs) -> anyhow::Result<i32> {
    let config = load_config(&args.config)?;
    config.grid.validate()?;

    let api = SessionApiClient::new(config.grid)?;
    if api.stop_session(&args.session_id).await? {
        eprintln!("✅ Session {} stopped", args.session_id);
        Ok(EXIT_SUCCESS)
    } else {
        eprintln!("❌ Grid refused to stop session {}", args.session_id);
        Ok(EXIT_INFRA_ERROR)
    }
}
