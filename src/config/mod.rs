use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{ ensure, Context, Result };
use rust_decimal::Decimal;
use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::Level;
use url::Url;

use crate::ledger::{ Balances, Ledger };
use crate::models::{ Asset, Triangle };
use crate::utils::serde_helpers::{ parse_level, serialize_level };

const DEFAULT_FEED_URL: &str = "wss://example.com/ws";

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub debug: bool,
    pub feed_url: Url,

    pub triangle: Triangle,
    pub initial_balances: Balances,
    pub fee_rate: Decimal,
    pub slippage_rate: Decimal,
    pub notional: Decimal,
    pub report_interval_secs: u64,

    #[serde(serialize_with = "serialize_level")]
    pub log_level: Level,
    pub log_config: LogConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogConfig {
    pub directory: PathBuf,
    pub filename_prefix: String,
    pub rotation: LogRotation,
    pub max_files: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogRotation {
    Hourly,
    Daily,
    Never,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load environment variables from .env file
        match dotenv::dotenv() {
            Ok(path) => {
                println!("✅ Loaded .env file from: {}", path.display());
            }
            Err(e) => {
                println!("⚠️  Could not load .env file ({}), using process environment", e);
            }
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup, applying defaults for missing keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self> where F: Fn(&str) -> Option<String> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let debug = var("TRI_DEBUG", "false")
            .parse::<bool>()
            .context("Failed to parse TRI_DEBUG environment variable")?;

        let feed_url = Url::parse(&var("TRI_FEED_URL", DEFAULT_FEED_URL)).context(
            "Failed to parse TRI_FEED_URL environment variable"
        )?;

        let triangle = Triangle::new(
            var("TRI_ASSET_A", "FIL"),
            var("TRI_ASSET_B", "ETH"),
            var("TRI_ASSET_C", "BSV")
        );

        let decimal = |key: &str, default: &str| -> Result<Decimal> {
            Decimal::from_str(var(key, default).trim()).with_context(||
                format!("Failed to parse {} environment variable", key)
            )
        };

        let initial_balances = Balances {
            a: decimal("TRI_BALANCE_A", "700")?,
            b: decimal("TRI_BALANCE_B", "0")?,
            c: decimal("TRI_BALANCE_C", "0")?,
        };
        let fee_rate = decimal("TRI_FEE_RATE", "0.001")?;
        let slippage_rate = decimal("TRI_SLIPPAGE_RATE", "0.0001")?;
        let notional = decimal("TRI_NOTIONAL", "100")?;

        let report_interval_secs = var("TRI_REPORT_INTERVAL_SECS", "10")
            .parse::<u64>()
            .context("Failed to parse TRI_REPORT_INTERVAL_SECS environment variable")?;

        // Unknown levels fall back to info
        let log_level = parse_level(&var("TRI_LOG_LEVEL", "info")).unwrap_or(Level::INFO);

        let log_rotation = match var("TRI_LOG_ROTATION", "daily").to_lowercase().as_str() {
            "hourly" => LogRotation::Hourly,
            "never" => LogRotation::Never,
            _ => LogRotation::Daily,
        };

        let log_config = LogConfig {
            directory: PathBuf::from(var("TRI_LOG_DIRECTORY", "logs")),
            filename_prefix: var("TRI_LOG_FILENAME_PREFIX", "triangular_arbitrage"),
            rotation: log_rotation,
            max_files: lookup("TRI_LOG_MAX_FILES").and_then(|s| s.parse::<usize>().ok()),
        };

        let config = Config {
            debug,
            feed_url,
            triangle,
            initial_balances,
            fee_rate,
            slippage_rate,
            notional,
            report_interval_secs,
            log_level,
            log_config,
        };
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.notional > Decimal::ZERO, "TRI_NOTIONAL must be positive");
        ensure!(self.report_interval_secs > 0, "TRI_REPORT_INTERVAL_SECS must be positive");
        for asset in Asset::iter() {
            ensure!(
                self.initial_balances.get(asset) >= Decimal::ZERO,
                "initial balance of {} must not be negative",
                self.triangle.asset_name(asset)
            );
        }
        // Rate bounds are checked by the ledger itself
        self.ledger()?;
        Ok(())
    }

    #[inline]
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }

    /// Fresh ledger seeded with the configured balances and cost model
    pub fn ledger(&self) -> Result<Ledger> {
        Ledger::new(self.initial_balances, self.fee_rate, self.slippage_rate).context(
            "Invalid fee or slippage configuration"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use rust_decimal_macros::dec;
    use crate::models::SymbolId;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.initial_balances, Balances { a: dec!(700), b: dec!(0), c: dec!(0) });
        assert_eq!(config.fee_rate, dec!(0.001));
        assert_eq!(config.slippage_rate, dec!(0.0001));
        assert_eq!(config.notional, dec!(100));
        assert_eq!(config.report_interval(), Duration::from_secs(10));
        assert_eq!(config.feed_url.as_str(), "wss://example.com/ws");
        assert_eq!(config.triangle.symbol_name(SymbolId::AC), "FIL-BSV");
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.log_config.rotation, LogRotation::Daily);
        assert!(!config.debug);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(
            &[
                ("TRI_ASSET_A", "BTC"),
                ("TRI_ASSET_B", "ETH"),
                ("TRI_ASSET_C", "USDT"),
                ("TRI_BALANCE_A", "1.5"),
                ("TRI_FEE_RATE", "0.00075"),
                ("TRI_NOTIONAL", "0.25"),
                ("TRI_LOG_LEVEL", "DEBUG"),
                ("TRI_LOG_ROTATION", "hourly"),
                ("TRI_LOG_MAX_FILES", "7"),
            ]
        ).unwrap();

        assert_eq!(config.triangle.symbol_name(SymbolId::BC), "ETH-USDT");
        assert_eq!(config.initial_balances.a, dec!(1.5));
        assert_eq!(config.fee_rate, dec!(0.00075));
        assert_eq!(config.notional, dec!(0.25));
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.log_config.rotation, LogRotation::Hourly);
        assert_eq!(config.log_config.max_files, Some(7));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config_from(&[("TRI_FEE_RATE", "abc")]).is_err());
        assert!(config_from(&[("TRI_FEE_RATE", "1")]).is_err());
        assert!(config_from(&[("TRI_SLIPPAGE_RATE", "-0.01")]).is_err());
        assert!(config_from(&[("TRI_NOTIONAL", "0")]).is_err());
        assert!(config_from(&[("TRI_BALANCE_B", "-5")]).is_err());
        assert!(config_from(&[("TRI_FEED_URL", "not a url")]).is_err());
        assert!(config_from(&[("TRI_REPORT_INTERVAL_SECS", "0")]).is_err());
    }

    #[test]
    fn test_unknown_log_level_falls_back_to_info() {
        let config = config_from(&[("TRI_LOG_LEVEL", "verbose")]).unwrap();
        assert_eq!(config.log_level, Level::INFO);
    }
}
