use strum_macros::Display;

use crate::models::quote::Quote;

/// Which side of a quote a leg trades against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    /// Price of the given quote on this side
    #[inline]
    pub fn price_of(self, quote: &Quote) -> rust_decimal::Decimal {
        match self {
            Side::Bid => quote.bid,
            Side::Ask => quote.ask,
        }
    }
}
