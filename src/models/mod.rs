pub mod quote;
pub mod symbol;

pub use quote::{ Quote, QuoteMessage };
pub use symbol::{ Asset, SymbolId, Triangle };
