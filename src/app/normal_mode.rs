use anyhow::{ Context, Result };
use tokio::sync::watch;
use tracing::{ error, info, warn };

use crate::{
    app::pipeline::{ run_pipeline, StopReason },
    arbitrage::ArbitrageEngine,
    config::Config,
    exchange::WsQuoteFeed,
    models::Asset,
    utils::console::{ print_app_starting, print_app_stopped, print_config },
};

/// Connect to the configured feed and simulate until the feed ends or Ctrl+C
pub fn run_normal_mode(config: Config) -> Result<StopReason> {
    print_app_starting();
    print_config(&config);

    let engine = ArbitrageEngine::new(config.ledger()?, config.notional, config.triangle.clone());
    info!(
        "Tracking {} with notional {} {}",
        config.triangle,
        config.notional,
        config.triangle.asset_name(Asset::A)
    );

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Set up Ctrl+C handler
    ctrlc
        ::set_handler(move || {
            info!("Received Ctrl+C, shutting down...");
            shutdown_tx.send_replace(true);
        })
        .context("Error setting Ctrl-C handler")?;

    let rt = tokio::runtime::Builder
        ::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    let reason = rt.block_on(async {
        let feed = WsQuoteFeed::connect(&config.feed_url).await?;
        info!("Streaming quotes from {}", feed.endpoint());
        let (ledger, reason) = run_pipeline(
            feed,
            engine,
            config.report_interval(),
            shutdown_rx
        ).await;

        if ledger.overdrafts() > 0 {
            warn!("{} debits overdrew a balance during this run", ledger.overdrafts());
        }

        Ok::<_, anyhow::Error>(reason)
    })?;

    match &reason {
        StopReason::Shutdown => info!("Stopped on request"),
        StopReason::FeedUnavailable(cause) => {
            // Reconnect policy belongs to whoever supervises this process
            error!("Stopped because the quote feed is unavailable: {}", cause);
        }
    }

    print_app_stopped();
    Ok(reason)
}
