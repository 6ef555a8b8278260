pub mod detector;
pub mod engine;
pub mod executor;

pub use detector::{ ArbitrageOpportunity, Leg };
pub use engine::ArbitrageEngine;
pub use executor::{ ArbitrageExecutor, CycleReport, LegFill };
