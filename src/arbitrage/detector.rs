// src/arbitrage/detector.rs

use colored::Colorize;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::trace;

use crate::enums::{ Direction, Side };
use crate::models::{ Asset, Quote, SymbolId };
use crate::orderbook::Snapshot;

/// One conversion step of a cycle: trade `symbol` on `side`, moving value from `from` to `to`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leg {
    pub symbol: SymbolId,
    pub side: Side,
    pub from: Asset,
    pub to: Asset,
}

const FORWARD_LEGS: [Leg; 3] = [
    Leg { symbol: SymbolId::AB, side: Side::Ask, from: Asset::A, to: Asset::B },
    Leg { symbol: SymbolId::BC, side: Side::Ask, from: Asset::B, to: Asset::C },
    Leg { symbol: SymbolId::AC, side: Side::Bid, from: Asset::C, to: Asset::A },
];

const REVERSE_LEGS: [Leg; 3] = [
    Leg { symbol: SymbolId::AC, side: Side::Ask, from: Asset::A, to: Asset::C },
    Leg { symbol: SymbolId::BC, side: Side::Bid, from: Asset::C, to: Asset::B },
    Leg { symbol: SymbolId::AB, side: Side::Bid, from: Asset::B, to: Asset::A },
];

/// Legs of a cycle in execution order
#[inline]
pub fn legs(direction: Direction) -> &'static [Leg; 3] {
    match direction {
        Direction::Forward => &FORWARD_LEGS,
        Direction::Reverse => &REVERSE_LEGS,
    }
}

/// A cycle whose condition holds on the evaluated snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArbitrageOpportunity {
    pub direction: Direction,
    /// Edge of the cheap side over the rich side after fee and slippage drag
    pub implied_gain: Decimal,
    /// Price of each leg, in leg order
    pub prices: [Decimal; 3],
}

impl ArbitrageOpportunity {
    #[inline]
    pub fn legs(&self) -> &'static [Leg; 3] {
        legs(self.direction)
    }

    #[inline]
    pub fn gain_percentage(&self) -> Decimal {
        self.implied_gain * dec!(100)
    }

    /// Format opportunity for display
    pub fn display(&self) -> String {
        let legs = self.legs();
        format!(
            "{} {} → {} → {} | Gain: {}%",
            self.direction.to_string().bright_purple().bold(),
            legs[0].symbol.to_string().green(),
            legs[1].symbol.to_string().yellow(),
            legs[2].symbol.to_string().green(),
            self.gain_percentage().round_dp(4).to_string().bright_green()
        )
    }
}

/// The three quotes, only when every one of them is present and usable
fn usable_quotes(snapshot: &Snapshot) -> Option<[Quote; 3]> {
    let ab = *snapshot.get(SymbolId::AB)?;
    let bc = *snapshot.get(SymbolId::BC)?;
    let ac = *snapshot.get(SymbolId::AC)?;

    [ab, bc, ac]
        .iter()
        .all(Quote::is_usable)
        .then_some([ab, bc, ac])
}

fn resolve_prices(direction: Direction, quotes: &[Quote; 3]) -> [Decimal; 3] {
    (*legs(direction)).map(|leg| leg.side.price_of(&quotes[leg.symbol.index()]))
}

/// Buying through the intermediate pair must cost less than the direct bid after drag.
///
/// `None` when the condition fails or any step leaves the decimal range.
fn forward_gain([ab, bc, ac]: &[Quote; 3], fee_rate: Decimal, slippage_rate: Decimal) -> Option<Decimal> {
    let cost = ab.ask.checked_mul(bc.ask)?;
    let proceeds = ac.bid
        .checked_mul(Decimal::ONE - fee_rate)?
        .checked_mul(Decimal::ONE - slippage_rate)?;
    if cost >= proceeds {
        return None;
    }
    // A product that rounds to zero has no usable ratio
    proceeds.checked_div(cost)?.checked_sub(Decimal::ONE)
}

/// Selling through the intermediate pair must beat the direct ask after drag
fn reverse_gain([ab, bc, ac]: &[Quote; 3], fee_rate: Decimal, slippage_rate: Decimal) -> Option<Decimal> {
    let proceeds = ab.bid.checked_mul(bc.bid)?;
    let cost = ac.ask
        .checked_mul(Decimal::ONE + fee_rate)?
        .checked_mul(Decimal::ONE + slippage_rate)?;
    if proceeds <= cost {
        return None;
    }
    proceeds.checked_div(cost)?.checked_sub(Decimal::ONE)
}

/// Check both cycle conditions against a snapshot.
///
/// Returns zero, one or two opportunities; forward comes first when both
/// hold. Missing or unusable quotes yield nothing, as do prices whose
/// products overflow or vanish at 28 decimal places.
pub fn detect(
    snapshot: &Snapshot,
    fee_rate: Decimal,
    slippage_rate: Decimal
) -> Vec<ArbitrageOpportunity> {
    let Some(quotes) = usable_quotes(snapshot) else {
        trace!("Snapshot incomplete or unusable, skipping evaluation");
        return Vec::new();
    };

    let mut opportunities = Vec::with_capacity(2);

    if let Some(implied_gain) = forward_gain(&quotes, fee_rate, slippage_rate) {
        opportunities.push(ArbitrageOpportunity {
            direction: Direction::Forward,
            implied_gain,
            prices: resolve_prices(Direction::Forward, &quotes),
        });
    }

    if let Some(implied_gain) = reverse_gain(&quotes, fee_rate, slippage_rate) {
        opportunities.push(ArbitrageOpportunity {
            direction: Direction::Reverse,
            implied_gain,
            prices: resolve_prices(Direction::Reverse, &quotes),
        });
    }

    opportunities
}
