use anyhow::{ Context, Result };

use tri_arb::{ app, app::pipeline::StopReason, config::Config, utils::logging };

fn main() -> Result<()> {
    // Load configuration with helpful error messages
    let config = Config::from_env().context(
        "Failed to load configuration from environment. Check the TRI_* variables or your .env file."
    )?;

    // Initialize logging system
    let _log_guards = logging
        ::init_logging(config.log_level, config.debug, &config.log_config)
        .context("Failed to initialize logging system")?;

    match app::normal_mode::run_normal_mode(config)? {
        StopReason::Shutdown => Ok(()),
        StopReason::FeedUnavailable(cause) => {
            Err(anyhow::anyhow!("quote feed unavailable: {}", cause))
        }
    }
}
