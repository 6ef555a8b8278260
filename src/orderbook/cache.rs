// src/orderbook/cache.rs

use std::time::{ Duration, Instant };

use parking_lot::RwLock;
use tracing::trace;

use crate::models::{ Quote, SymbolId };

/// A quote together with the instant it was stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedQuote {
    pub quote: Quote,
    pub received_at: Instant,
}

/// Latest top of book for each of the three tracked pairs.
///
/// Entries are replaced wholesale (last write wins) and never evicted.
/// Slots sit behind one lock so a snapshot can never observe a quote that
/// is halfway through being replaced.
#[derive(Debug, Default)]
pub struct QuoteCache {
    slots: RwLock<[Option<CachedQuote>; 3]>,
}

impl QuoteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored quote for `quote.symbol`
    #[inline]
    pub fn update(&self, quote: Quote) {
        self.update_at(quote, Instant::now());
    }

    pub fn update_at(&self, quote: Quote, received_at: Instant) {
        let mut slots = self.slots.write();
        slots[quote.symbol.index()] = Some(CachedQuote { quote, received_at });
        trace!(symbol = %quote.symbol, bid = %quote.bid, ask = %quote.ask, "Quote cached");
    }

    /// Copy of all three slots taken under a single read lock
    #[inline]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot { slots: *self.slots.read() }
    }
}

/// Point-in-time view of the cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Snapshot {
    slots: [Option<CachedQuote>; 3],
}

impl Snapshot {
    pub fn from_quotes(quotes: impl IntoIterator<Item = Quote>) -> Self {
        let now = Instant::now();
        let mut slots = [None; 3];
        for quote in quotes {
            slots[quote.symbol.index()] = Some(CachedQuote { quote, received_at: now });
        }
        Self { slots }
    }

    #[inline]
    pub fn get(&self, symbol: SymbolId) -> Option<&Quote> {
        self.slots[symbol.index()].as_ref().map(|cached| &cached.quote)
    }

    #[inline]
    pub fn received_at(&self, symbol: SymbolId) -> Option<Instant> {
        self.slots[symbol.index()].map(|cached| cached.received_at)
    }

    /// True when every pair has a quote
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Copy of this snapshot with entries older than `max_age` dropped
    pub fn fresh_within(&self, max_age: Duration, now: Instant) -> Snapshot {
        let mut slots = self.slots;
        for slot in slots.iter_mut() {
            let stale = slot.is_some_and(
                |cached| now.saturating_duration_since(cached.received_at) > max_age
            );
            if stale {
                *slot = None;
            }
        }
        Snapshot { slots }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{ AtomicBool, Ordering };
    use rust_decimal_macros::dec;

    #[test]
    fn test_last_write_wins() {
        let cache = QuoteCache::new();
        cache.update(Quote::new(SymbolId::AB, dec!(0.09), dec!(0.1)));
        cache.update(Quote::new(SymbolId::AB, dec!(0.2), dec!(0.21)));

        let snapshot = cache.snapshot();
        assert_eq!(snapshot.get(SymbolId::AB), Some(&Quote::new(SymbolId::AB, dec!(0.2), dec!(0.21))));
        assert!(snapshot.get(SymbolId::BC).is_none());
        assert!(!snapshot.is_complete());
    }

    #[test]
    fn test_snapshot_is_detached_from_later_updates() {
        let cache = QuoteCache::new();
        cache.update(Quote::new(SymbolId::BC, dec!(0.4), dec!(0.5)));
        let before = cache.snapshot();
        cache.update(Quote::new(SymbolId::BC, dec!(0.6), dec!(0.7)));

        assert_eq!(before.get(SymbolId::BC).map(|q| q.ask), Some(dec!(0.5)));
        assert_eq!(cache.snapshot().get(SymbolId::BC).map(|q| q.ask), Some(dec!(0.7)));
    }

    #[test]
    fn test_complete_after_all_pairs() {
        let cache = QuoteCache::new();
        cache.update(Quote::new(SymbolId::AB, dec!(0.09), dec!(0.1)));
        cache.update(Quote::new(SymbolId::BC, dec!(0.4), dec!(0.5)));
        cache.update(Quote::new(SymbolId::AC, dec!(0.06), dec!(0.07)));
        assert!(cache.snapshot().is_complete());
    }

    #[test]
    fn test_fresh_within_drops_stale_entries() {
        let cache = QuoteCache::new();
        let start = Instant::now();
        cache.update_at(Quote::new(SymbolId::AB, dec!(0.09), dec!(0.1)), start);
        cache.update_at(
            Quote::new(SymbolId::BC, dec!(0.4), dec!(0.5)),
            start + Duration::from_secs(5)
        );

        let fresh = cache.snapshot().fresh_within(Duration::from_secs(2), start + Duration::from_secs(6));
        assert!(fresh.get(SymbolId::AB).is_none());
        assert!(fresh.get(SymbolId::BC).is_some());
        assert_eq!(fresh.received_at(SymbolId::BC), Some(start + Duration::from_secs(5)));
    }

    #[test]
    fn test_concurrent_snapshot_never_sees_torn_quote() {
        // Writers alternate between two quotes whose bid and ask are tied together.
        // A torn read would pair a bid from one with an ask from the other.
        let cache = Arc::new(QuoteCache::new());
        let low = Quote::new(SymbolId::AC, dec!(1), dec!(2));
        let high = Quote::new(SymbolId::AC, dec!(10), dec!(20));
        cache.update(low);

        let done = Arc::new(AtomicBool::new(false));
        let writer = {
            let cache = cache.clone();
            let done = done.clone();
            std::thread::spawn(move || {
                let mut flip = false;
                while !done.load(Ordering::Relaxed) {
                    cache.update(if flip { high } else { low });
                    flip = !flip;
                }
            })
        };

        for _ in 0..50_000 {
            let snapshot = cache.snapshot();
            let quote = snapshot.get(SymbolId::AC).copied();
            assert!(quote == Some(low) || quote == Some(high), "torn quote: {:?}", quote);
            let quote = quote.unwrap();
            assert_eq!(quote.ask, quote.bid * dec!(2));
        }

        done.store(true, Ordering::Relaxed);
        writer.join().unwrap();
    }
}
