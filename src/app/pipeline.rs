// src/app/pipeline.rs

use std::time::Duration;

use tokio::sync::{ mpsc, watch };
use tokio::time::{ interval_at, Instant, MissedTickBehavior };
use tracing::{ debug, error, info, trace, warn };

use crate::arbitrage::{ ArbitrageEngine, CycleReport };
use crate::exchange::{ decode_frame, QuoteFeed };
use crate::ledger::{ Balances, Ledger };
use crate::models::{ Quote, Triangle };
use crate::orderbook::QuoteCache;

/// Depth of the ingestion → decision handoff. With one slot the ingestion
/// task waits for the decision task instead of queueing or dropping quotes.
pub const HANDOFF_CAPACITY: usize = 1;

/// What the ingestion task passes to the decision task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handoff {
    Quote(Quote),
    /// The feed closed or failed; no more quotes will follow
    FeedUnavailable(String),
}

/// Why the decision loop returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    FeedUnavailable(String),
    Shutdown,
}

/// Counters kept by the ingestion task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionStats {
    pub accepted: u64,
    pub untracked: u64,
    pub malformed: u64,
}

pub fn handoff_channel() -> (mpsc::Sender<Handoff>, mpsc::Receiver<Handoff>) {
    mpsc::channel(HANDOFF_CAPACITY)
}

/// Resolves once `shutdown` reads `true`. Never resolves if the sender is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Pull frames from the feed and hand every tracked quote to the decision task, in order.
///
/// Untracked symbols and malformed frames are skipped. When the feed ends
/// the decision task is told so before this returns.
pub async fn run_ingestion<F: QuoteFeed>(
    mut feed: F,
    triangle: Triangle,
    handoff: mpsc::Sender<Handoff>
) -> IngestionStats {
    let mut stats = IngestionStats::default();

    let reason = loop {
        let frame = match feed.next_frame().await {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => {
                error!("Quote feed failed: {}", e);
                break e.to_string();
            }
            None => {
                break "quote feed closed".to_string();
            }
        };

        match decode_frame(&frame, &triangle) {
            Ok(Some(quote)) => {
                stats.accepted += 1;
                // Blocks while the decision task is still busy with the previous quote
                if handoff.send(Handoff::Quote(quote)).await.is_err() {
                    debug!("Decision task stopped, ending ingestion");
                    return stats;
                }
            }
            Ok(None) => {
                stats.untracked += 1;
                trace!(frame = %frame, "Ignoring untracked symbol");
            }
            Err(e) => {
                stats.malformed += 1;
                warn!(frame = %frame, "Skipping quote frame: {}", e);
            }
        }
    };

    info!(
        accepted = stats.accepted,
        untracked = stats.untracked,
        malformed = stats.malformed,
        "Ingestion stopped: {}",
        reason
    );

    if handoff.send(Handoff::FeedUnavailable(reason)).await.is_err() {
        debug!("Decision task already stopped");
    }

    stats
}

/// The single consumer of the handoff. Owns the cache and the engine (and
/// through it the ledger), so neither needs locking beyond the handoff.
pub struct DecisionLoop {
    cache: QuoteCache,
    engine: ArbitrageEngine,
    balances: watch::Sender<Balances>,
}

impl DecisionLoop {
    pub fn new(engine: ArbitrageEngine) -> (Self, watch::Receiver<Balances>) {
        let (balances, balances_rx) = watch::channel(engine.ledger().balances());
        let decision = Self {
            cache: QuoteCache::new(),
            engine,
            balances,
        };
        (decision, balances_rx)
    }

    #[inline]
    pub fn engine(&self) -> &ArbitrageEngine {
        &self.engine
    }

    /// Store the quote, evaluate the fresh snapshot and publish balances if they moved
    pub fn on_quote(&mut self, quote: Quote) -> Vec<CycleReport> {
        self.cache.update(quote);
        let reports = self.engine.evaluate(&self.cache.snapshot());

        if !reports.is_empty() {
            self.balances.send_replace(self.engine.ledger().balances());
        }

        reports
    }

    /// Process handoffs one at a time until the feed goes away or shutdown is requested.
    ///
    /// Returns the ledger so the caller owns the final state.
    pub async fn run(
        mut self,
        mut handoff: mpsc::Receiver<Handoff>,
        mut shutdown: watch::Receiver<bool>
    ) -> (Ledger, StopReason) {
        info!("Decision loop started for {}", self.engine.triangle());

        let reason = loop {
            tokio::select! {
                biased;

                _ = shutdown_requested(&mut shutdown) => {
                    info!("Shutdown requested, stopping decision loop");
                    break StopReason::Shutdown;
                }
                next = handoff.recv() => match next {
                    Some(Handoff::Quote(quote)) => {
                        self.on_quote(quote);
                    }
                    Some(Handoff::FeedUnavailable(reason)) => {
                        error!("Feed unavailable: {}", reason);
                        break StopReason::FeedUnavailable(reason);
                    }
                    None => {
                        error!("Ingestion task stopped without notice");
                        break StopReason::FeedUnavailable("ingestion task stopped".to_string());
                    }
                },
            }
        };

        info!(
            cycles = self.engine.cycles_executed(),
            overdrafts = self.engine.ledger().overdrafts(),
            "Decision loop stopped"
        );

        (self.engine.into_ledger(), reason)
    }
}

/// Log the latest published balances every `period` until shutdown.
///
/// Reads only the watch channel, never the ledger itself, so it cannot
/// stall the decision loop. Returns how many reports were emitted.
pub async fn run_reporter(
    balances: watch::Receiver<Balances>,
    triangle: Triangle,
    period: Duration,
    mut shutdown: watch::Receiver<bool>
) -> u64 {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut reports = 0;

    loop {
        tokio::select! {
            _ = shutdown_requested(&mut shutdown) => break,
            _ = ticker.tick() => {
                let current = *balances.borrow();
                info!("Current balances: {}", current.display(&triangle));
                reports += 1;
            }
        }
    }

    reports
}

/// Run ingestion, decision loop and reporter until the feed ends or shutdown is requested
pub async fn run_pipeline<F: QuoteFeed + 'static>(
    feed: F,
    engine: ArbitrageEngine,
    report_interval: Duration,
    shutdown: watch::Receiver<bool>
) -> (Ledger, StopReason) {
    let triangle = engine.triangle().clone();
    let (handoff_tx, handoff_rx) = handoff_channel();
    let (decision, balances_rx) = DecisionLoop::new(engine);

    let ingestion = tokio::spawn(run_ingestion(feed, triangle.clone(), handoff_tx));

    // The reporter follows the decision loop rather than the caller's signal
    let (reporter_stop_tx, reporter_stop_rx) = watch::channel(false);
    let reporter = tokio::spawn(
        run_reporter(balances_rx, triangle.clone(), report_interval, reporter_stop_rx)
    );

    let (ledger, reason) = decision.run(handoff_rx, shutdown).await;

    // The feed may sit idle forever, so do not wait for it
    ingestion.abort();
    reporter_stop_tx.send_replace(true);
    if let Err(e) = reporter.await {
        warn!("Reporter task failed: {:?}", e);
    }

    info!("Final balances: {}", ledger.balances().display(&triangle));

    (ledger, reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use crate::models::{ Asset, SymbolId };

    fn engine() -> ArbitrageEngine {
        let ledger = Ledger::new(
            Balances { a: dec!(700), b: dec!(0), c: dec!(0) },
            dec!(0.001),
            dec!(0.0001)
        ).unwrap();
        ArbitrageEngine::new(ledger, dec!(100), Triangle::default())
    }

    #[test]
    fn test_on_quote_evaluates_after_every_update() {
        let (mut decision, balances) = DecisionLoop::new(engine());

        assert!(decision.on_quote(Quote::new(SymbolId::AB, dec!(0.09), dec!(0.1))).is_empty());
        assert!(decision.on_quote(Quote::new(SymbolId::BC, dec!(0.45), dec!(0.5))).is_empty());
        assert_eq!(*balances.borrow(), decision.engine().ledger().balances());

        // Third pair completes the triangle and the forward condition holds
        let reports = decision.on_quote(Quote::new(SymbolId::AC, dec!(0.06), dec!(0.07)));
        assert_eq!(reports.len(), 1);
        assert!(balances.has_changed().unwrap());
        assert_eq!(balances.borrow().a, decision.engine().ledger().balance(Asset::A));
    }

    #[tokio::test]
    async fn test_shutdown_stops_decision_loop() {
        let (decision, _balances) = DecisionLoop::new(engine());
        let (_handoff_tx, handoff_rx) = handoff_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(decision.run(handoff_rx, shutdown_rx));
        shutdown_tx.send_replace(true);

        let (ledger, reason) = handle.await.unwrap();
        assert_eq!(reason, StopReason::Shutdown);
        assert_eq!(ledger.balances().a, dec!(700));
    }

    #[tokio::test]
    async fn test_dropped_handoff_reports_feed_unavailable() {
        let (decision, _balances) = DecisionLoop::new(engine());
        let (handoff_tx, handoff_rx) = handoff_channel();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        drop(handoff_tx);

        let (_, reason) = decision.run(handoff_rx, shutdown_rx).await;
        assert!(matches!(reason, StopReason::FeedUnavailable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reporter_fires_on_fixed_interval() {
        let (_balances_tx, balances_rx) = watch::channel(Balances::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let reporter = tokio::spawn(
            run_reporter(balances_rx, Triangle::default(), Duration::from_secs(10), shutdown_rx)
        );

        tokio::time::sleep(Duration::from_secs(35)).await;
        shutdown_tx.send_replace(true);

        assert_eq!(reporter.await.unwrap(), 3);
    }
}
