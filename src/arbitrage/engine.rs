// src/arbitrage/engine.rs

use rust_decimal::Decimal;
use tracing::{ info, warn };

use crate::arbitrage::detector::{ self, ArbitrageOpportunity };
use crate::arbitrage::executor::{ ArbitrageExecutor, CycleReport };
use crate::ledger::Ledger;
use crate::models::{ Asset, Triangle };
use crate::orderbook::Snapshot;

/// Detects opportunities on a snapshot and simulates them against the owned ledger.
///
/// Stateless per call: evaluating the same snapshot twice fires twice.
#[derive(Debug)]
pub struct ArbitrageEngine {
    ledger: Ledger,
    executor: ArbitrageExecutor,
    triangle: Triangle,
    cycles_executed: u64,
}

impl ArbitrageEngine {
    pub fn new(ledger: Ledger, notional: Decimal, triangle: Triangle) -> Self {
        Self {
            ledger,
            executor: ArbitrageExecutor::new(notional),
            triangle,
            cycles_executed: 0,
        }
    }

    #[inline]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    #[inline]
    pub fn triangle(&self) -> &Triangle {
        &self.triangle
    }

    #[inline]
    pub fn cycles_executed(&self) -> u64 {
        self.cycles_executed
    }

    pub fn into_ledger(self) -> Ledger {
        self.ledger
    }

    /// Check both directions and execute every cycle whose condition holds.
    ///
    /// Forward runs before reverse. An incomplete or unusable snapshot, or a
    /// cycle whose amounts cannot be represented, leaves the ledger untouched.
    pub fn evaluate(&mut self, snapshot: &Snapshot) -> Vec<CycleReport> {
        let opportunities = detector::detect(
            snapshot,
            self.ledger.fee_rate(),
            self.ledger.slippage_rate()
        );

        opportunities
            .iter()
            .filter_map(|opportunity| self.execute(opportunity))
            .collect()
    }

    fn execute(&mut self, opportunity: &ArbitrageOpportunity) -> Option<CycleReport> {
        info!("Arbitrage detected: {}", opportunity.display());

        let Some(report) = self.executor.execute(opportunity, &mut self.ledger) else {
            warn!(
                direction = %opportunity.direction,
                notional = %self.executor.notional(),
                prices = ?opportunity.prices,
                "Cycle amounts out of decimal range, skipping"
            );
            return None;
        };
        self.cycles_executed += 1;
        self.log_cycle(&report);

        Some(report)
    }

    fn log_cycle(&self, report: &CycleReport) {
        let name = |asset: Asset| self.triangle.asset_name(asset);

        for fill in &report.fills {
            info!(
                symbol = self.triangle.symbol_name(fill.leg.symbol),
                side = %fill.leg.side,
                price = %fill.price,
                "Spent {:.6} {} for {:.6} {}",
                fill.spent,
                name(fill.leg.from),
                fill.received,
                name(fill.leg.to)
            );
        }

        let overdrafts = report.overdrafts().count();
        if overdrafts > 0 {
            warn!(
                direction = %report.direction,
                overdrafts,
                "Cycle completed with overdrawn balances"
            );
        }

        info!(
            direction = %report.direction,
            "Cycle complete: {} committed {:.6}, returned {:.6}, net {:+.6}. Balances: {}",
            name(Asset::A),
            report.fills[0].spent,
            report.fills[2].received,
            report.net_change(),
            self.ledger.balances().display(&self.triangle)
        );
    }
}
