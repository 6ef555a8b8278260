pub mod app;
pub mod arbitrage;
pub mod config;
pub mod enums;
pub mod exchange;
pub mod ledger;
pub mod models;
pub mod orderbook;
pub mod utils;
