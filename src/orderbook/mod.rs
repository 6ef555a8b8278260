pub mod cache;

pub use cache::{ CachedQuote, QuoteCache, Snapshot };
