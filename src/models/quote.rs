use rust_decimal::Decimal;
use serde::Deserialize;

use super::symbol::SymbolId;

/// Best bid/ask for one tracked pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub symbol: SymbolId,
    pub bid: Decimal,
    pub ask: Decimal,
}

impl Quote {
    #[inline]
    pub fn new(symbol: SymbolId, bid: Decimal, ask: Decimal) -> Self {
        Self { symbol, bid, ask }
    }

    /// Positive prices and an uncrossed top of book
    #[inline]
    pub fn is_usable(&self) -> bool {
        self.bid > Decimal::ZERO && self.ask >= self.bid
    }
}

/// A quote frame as it arrives on the wire
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteMessage {
    pub symbol: String,
    pub bid: Decimal,
    pub ask: Decimal,
}
