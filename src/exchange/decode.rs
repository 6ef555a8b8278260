use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{ Quote, QuoteMessage, Triangle };

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("malformed quote frame: {0}")] Json(#[from] serde_json::Error),
    #[error("non-positive price for {symbol}: bid {bid}, ask {ask}")] NonPositivePrice {
        symbol: String,
        bid: Decimal,
        ask: Decimal,
    },
}

/// Decode a text frame into a quote for one of the tracked pairs.
///
/// `Ok(None)` for well-formed frames about other symbols. Crossed quotes
/// (ask below bid) decode fine; the engine decides whether to trust them.
pub fn decode_frame(text: &str, triangle: &Triangle) -> Result<Option<Quote>, DecodeError> {
    let message: QuoteMessage = serde_json::from_str(text)?;

    let Some(symbol) = triangle.resolve(&message.symbol) else {
        return Ok(None);
    };

    if message.bid <= Decimal::ZERO || message.ask <= Decimal::ZERO {
        return Err(DecodeError::NonPositivePrice {
            symbol: message.symbol,
            bid: message.bid,
            ask: message.ask,
        });
    }

    Ok(Some(Quote::new(symbol, message.bid, message.ask)))
}
