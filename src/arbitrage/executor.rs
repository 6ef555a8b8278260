// src/arbitrage/executor.rs

use rust_decimal::Decimal;

use crate::arbitrage::detector::{ ArbitrageOpportunity, Leg };
use crate::enums::Direction;
use crate::ledger::{ Ledger, Overdraft };

/// What one leg did to the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegFill {
    pub leg: Leg,
    pub price: Decimal,
    /// Debited from `leg.from`, fee included
    pub spent: Decimal,
    /// Credited to `leg.to`, slippage deducted
    pub received: Decimal,
    pub overdraft: Option<Overdraft>,
}

/// Result of one simulated cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub direction: Direction,
    pub notional: Decimal,
    pub fills: [LegFill; 3],
}

impl CycleReport {
    /// Change of the starting asset over the whole cycle
    #[inline]
    pub fn net_change(&self) -> Decimal {
        self.fills[2].received - self.fills[0].spent
    }

    pub fn overdrafts(&self) -> impl Iterator<Item = &Overdraft> {
        self.fills.iter().filter_map(|fill| fill.overdraft.as_ref())
    }
}

/// Simulates a cycle against the ledger with a fixed notional of the base asset
#[derive(Debug, Clone, Copy)]
pub struct ArbitrageExecutor {
    notional: Decimal,
}

impl ArbitrageExecutor {
    pub fn new(notional: Decimal) -> Self {
        Self { notional }
    }

    #[inline]
    pub fn notional(&self) -> Decimal {
        self.notional
    }

    /// Apply the three legs of `opportunity` in order.
    ///
    /// Each leg converts the previous leg's proceeds (the notional for the
    /// first leg): the fee inflates what is debited and slippage deflates
    /// what is credited. Every amount and resulting balance is resolved
    /// before the first debit, so a cycle either runs all three legs or,
    /// when some number leaves the decimal range, none (`None`).
    pub fn execute(
        &self,
        opportunity: &ArbitrageOpportunity,
        ledger: &mut Ledger
    ) -> Option<CycleReport> {
        let (spent, received) = self.resolve_amounts(
            &opportunity.prices,
            ledger.fee_rate(),
            ledger.slippage_rate()
        )?;
        let legs = opportunity.legs();

        let start = ledger.balances();
        let mut projected = [start.a, start.b, start.c];
        for (i, leg) in legs.iter().enumerate() {
            let from = &mut projected[leg.from.index()];
            *from = from.checked_sub(spent[i])?;
            let to = &mut projected[leg.to.index()];
            *to = to.checked_add(received[i])?;
        }

        // from_fn visits indices in order, so legs run A-first as listed
        let fills: [LegFill; 3] = std::array::from_fn(|i| {
            let leg = legs[i];
            let overdraft = ledger.debit(leg.from, spent[i]);
            ledger.credit(leg.to, received[i]);

            LegFill {
                leg,
                price: opportunity.prices[i],
                spent: spent[i],
                received: received[i],
                overdraft,
            }
        });

        Some(CycleReport {
            direction: opportunity.direction,
            notional: self.notional,
            fills,
        })
    }

    /// Debit and credit of each leg, in leg order
    fn resolve_amounts(
        &self,
        prices: &[Decimal; 3],
        fee_rate: Decimal,
        slippage_rate: Decimal
    ) -> Option<([Decimal; 3], [Decimal; 3])> {
        let one_minus_fee = Decimal::ONE - fee_rate;
        let one_minus_slip = Decimal::ONE - slippage_rate;

        let mut spent = [Decimal::ZERO; 3];
        let mut received = [Decimal::ZERO; 3];
        let mut amount = self.notional;
        for (i, price) in prices.iter().enumerate() {
            spent[i] = amount.checked_div(one_minus_fee)?;
            received[i] = amount.checked_mul(*price)?.checked_mul(one_minus_slip)?;
            amount = received[i];
        }

        Some((spent, received))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use crate::arbitrage::detector::legs;
    use crate::ledger::Balances;
    use crate::models::Asset;

    fn ledger(a: Decimal, b: Decimal, c: Decimal) -> Ledger {
        Ledger::new(Balances { a, b, c }, dec!(0.001), dec!(0.0001)).unwrap()
    }

    fn opportunity(direction: Direction, prices: [Decimal; 3]) -> ArbitrageOpportunity {
        ArbitrageOpportunity { direction, implied_gain: Decimal::ZERO, prices }
    }

    #[test]
    fn test_forward_leg_chain() {
        let mut l = ledger(dec!(700), dec!(0), dec!(0));
        let executor = ArbitrageExecutor::new(dec!(100));
        let report = executor.execute(
            &opportunity(Direction::Forward, [dec!(0.1), dec!(0.5), dec!(0.06)]),
            &mut l
        ).unwrap();

        let fee = dec!(0.999);
        let slip = dec!(0.9999);
        let b_received = dec!(100) * dec!(0.1) * slip;
        let c_received = b_received * dec!(0.5) * slip;
        let a_received = c_received * dec!(0.06) * slip;

        assert_eq!(report.fills[0].spent, dec!(100) / fee);
        assert_eq!(report.fills[0].received, b_received);
        assert_eq!(report.fills[1].spent, b_received / fee);
        assert_eq!(report.fills[1].received, c_received);
        assert_eq!(report.fills[2].spent, c_received / fee);
        assert_eq!(report.fills[2].received, a_received);

        assert_eq!(l.balance(Asset::A), dec!(700) - dec!(100) / fee + a_received);
        assert_eq!(l.balance(Asset::B), b_received - b_received / fee);
        assert_eq!(l.balance(Asset::C), c_received - c_received / fee);
        assert_eq!(report.net_change(), a_received - dec!(100) / fee);
    }

    #[test]
    fn test_fee_drag_overdraws_empty_intermediate_balances() {
        // Spending `x / (1 - fee)` after receiving `x` leaves B and C short by the fee
        let mut l = ledger(dec!(700), dec!(0), dec!(0));
        let report = ArbitrageExecutor::new(dec!(100)).execute(
            &opportunity(Direction::Forward, [dec!(0.1), dec!(0.5), dec!(0.06)]),
            &mut l
        ).unwrap();

        let overdrawn: Vec<Asset> = report
            .overdrafts()
            .map(|o| o.asset)
            .collect();
        assert_eq!(overdrawn, vec![Asset::B, Asset::C]);
        assert!(l.balance(Asset::B) < Decimal::ZERO);
        assert!(l.balance(Asset::C) < Decimal::ZERO);
        assert_eq!(l.overdrafts(), 2);
    }

    #[test]
    fn test_reverse_cycle_is_mirrored() {
        let mut l = ledger(dec!(700), dec!(10), dec!(10));
        let report = ArbitrageExecutor::new(dec!(100)).execute(
            &opportunity(Direction::Reverse, [dec!(0.04), dec!(0.5), dec!(0.1)]),
            &mut l
        ).unwrap();

        let path: Vec<(Asset, Asset)> = report.fills
            .iter()
            .map(|f| (f.leg.from, f.leg.to))
            .collect();
        assert_eq!(path, vec![(Asset::A, Asset::C), (Asset::C, Asset::B), (Asset::B, Asset::A)]);
        assert_eq!(report.fills.map(|f| f.leg), *legs(Direction::Reverse));

        let slip = dec!(0.9999);
        let c_received = dec!(100) * dec!(0.04) * slip;
        let b_received = c_received * dec!(0.5) * slip;
        let a_received = b_received * dec!(0.1) * slip;
        assert_eq!(report.fills[2].received, a_received);
        assert_eq!(l.balance(Asset::A), dec!(700) - dec!(100) / dec!(0.999) + a_received);
        assert_eq!(report.overdrafts().count(), 0);
    }

    #[test]
    fn test_notional_is_fixed_not_fraction_of_balance() {
        let mut l = ledger(dec!(50), dec!(0), dec!(0));
        let report = ArbitrageExecutor::new(dec!(100)).execute(
            &opportunity(Direction::Forward, [dec!(0.1), dec!(0.5), dec!(0.06)]),
            &mut l
        ).unwrap();
        assert_eq!(report.fills[0].spent, dec!(100) / dec!(0.999));
        assert_eq!(report.fills[0].overdraft.map(|o| o.asset), Some(Asset::A));
    }

    #[test]
    fn test_out_of_range_cycle_leaves_ledger_untouched() {
        let mut l = ledger(dec!(700), dec!(0), dec!(0));
        let before = l.balances();

        // The second leg's proceeds exceed the decimal range
        let huge = dec!(1000000000000000);
        let report = ArbitrageExecutor::new(dec!(100)).execute(
            &opportunity(Direction::Forward, [huge, huge, dec!(0.5)]),
            &mut l
        );

        assert_eq!(report, None);
        assert_eq!(l.balances(), before);
        assert_eq!(l.overdrafts(), 0);
    }

    #[test]
    fn test_balance_overflow_is_caught_before_first_debit() {
        // Leg amounts fit, but crediting them onto B would not
        let mut l = ledger(dec!(700), Decimal::MAX, dec!(0));
        let report = ArbitrageExecutor::new(dec!(100)).execute(
            &opportunity(Direction::Forward, [dec!(0.1), dec!(0.5), dec!(0.06)]),
            &mut l
        );

        assert_eq!(report, None);
        assert_eq!(l.balance(Asset::A), dec!(700));
    }
}
