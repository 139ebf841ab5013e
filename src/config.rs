use crate::api::{Credentials, Network};
use crate::error::BotError;
use crate::execution::{Backoff, Executor, MarketFeed, SignalAdvance};
use crate::models::KlineInterval;
use crate::strategy::SmaCrossoverStrategy;
use crate::Result;
use config::{Config, Environment};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_SYMBOL: &str = "BTCUSDT";
const DEFAULT_TRADE_USD: &str = "10";
const DEFAULT_KLINE_LIMIT: u16 = 100;
const DEFAULT_SMA_SHORT: usize = 10;
const DEFAULT_SMA_LONG: usize = 50;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 25;
const DEFAULT_ERROR_BACKOFF_SECS: u64 = 10;
const DEFAULT_RECV_WINDOW_MS: u64 = 5000;
const MAX_KLINE_LIMIT: u16 = 1000;

/// Process settings, read from the environment
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub binance_api_key: Option<String>,
    pub binance_api_secret: Option<String>,
    pub symbol: String,
    pub trade_usd: Decimal,
    pub testnet: bool,
    pub kline_interval: KlineInterval,
    pub kline_limit: u16,
    pub sma_short: usize,
    pub sma_long: usize,
    pub poll_interval_secs: u64,
    pub error_backoff_secs: u64,
    pub max_error_backoff_secs: u64,
    pub signal_advance: SignalAdvance,
    pub recv_window_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            binance_api_key: None,
            binance_api_secret: None,
            symbol: DEFAULT_SYMBOL.to_string(),
            trade_usd: Decimal::TEN,
            testnet: true,
            kline_interval: KlineInterval::OneMinute,
            kline_limit: DEFAULT_KLINE_LIMIT,
            sma_short: DEFAULT_SMA_SHORT,
            sma_long: DEFAULT_SMA_LONG,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            error_backoff_secs: DEFAULT_ERROR_BACKOFF_SECS,
            max_error_backoff_secs: DEFAULT_ERROR_BACKOFF_SECS,
            signal_advance: SignalAdvance::OnSuccess,
            recv_window_ms: DEFAULT_RECV_WINDOW_MS,
        }
    }
}

impl Settings {
    /// Read settings from process environment variables
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn load() -> Result<Self> {
        Self::from_environment(Environment::default())
    }

    fn from_environment(environment: Environment) -> Result<Self> {
        let settings: Settings = Config::builder()
            .set_default("symbol", DEFAULT_SYMBOL)?
            .set_default("trade_usd", DEFAULT_TRADE_USD)?
            .set_default("testnet", true)?
            .set_default("kline_interval", KlineInterval::OneMinute.as_str())?
            .set_default("kline_limit", i64::from(DEFAULT_KLINE_LIMIT))?
            .set_default("sma_short", DEFAULT_SMA_SHORT as i64)?
            .set_default("sma_long", DEFAULT_SMA_LONG as i64)?
            .set_default("poll_interval_secs", DEFAULT_POLL_INTERVAL_SECS as i64)?
            .set_default("error_backoff_secs", DEFAULT_ERROR_BACKOFF_SECS as i64)?
            .set_default("max_error_backoff_secs", DEFAULT_ERROR_BACKOFF_SECS as i64)?
            .set_default("signal_advance", "on_success")?
            .set_default("recv_window_ms", DEFAULT_RECV_WINDOW_MS as i64)?
            // values stay strings; typed fields convert during deserialization
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(BotError::InvalidConfig(msg));

        if self.symbol.trim().is_empty() {
            return invalid("SYMBOL must not be empty".to_string());
        }
        if self.trade_usd <= Decimal::ZERO {
            return invalid(format!("TRADE_USD must be positive, got {}", self.trade_usd));
        }
        if self.sma_short == 0 || self.sma_short >= self.sma_long {
            return invalid(format!(
                "need 0 < SMA_SHORT < SMA_LONG, got {} and {}",
                self.sma_short, self.sma_long
            ));
        }
        if (self.kline_limit as usize) < self.sma_long + 1 || self.kline_limit > MAX_KLINE_LIMIT {
            return invalid(format!(
                "KLINE_LIMIT must be between SMA_LONG + 1 ({}) and {}, got {}",
                self.sma_long + 1,
                MAX_KLINE_LIMIT,
                self.kline_limit
            ));
        }
        if self.poll_interval_secs == 0 || self.error_backoff_secs == 0 {
            return invalid("POLL_INTERVAL_SECS and ERROR_BACKOFF_SECS must be positive".to_string());
        }
        if self.max_error_backoff_secs < self.error_backoff_secs {
            return invalid(format!(
                "MAX_ERROR_BACKOFF_SECS ({}) is below ERROR_BACKOFF_SECS ({})",
                self.max_error_backoff_secs, self.error_backoff_secs
            ));
        }

        Ok(())
    }

    /// API key pair, if both halves are set and non-empty
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.binance_api_key, &self.binance_api_secret) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                Some(Credentials::new(key.clone(), secret.clone()))
            }
            _ => None,
        }
    }

    pub fn network(&self) -> Network {
        Network::from_testnet_flag(self.testnet)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            Duration::from_secs(self.error_backoff_secs),
            Duration::from_secs(self.max_error_backoff_secs),
        )
    }

    pub fn strategy(&self) -> SmaCrossoverStrategy {
        SmaCrossoverStrategy::new(self.sma_short, self.sma_long)
    }

    pub fn feed(&self) -> MarketFeed {
        MarketFeed::new(self.symbol.clone(), self.kline_interval, self.kline_limit)
    }

    pub fn executor(&self) -> Executor {
        Executor::new(self.symbol.clone(), self.trade_usd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn from_vars(vars: &[(&str, &str)]) -> Result<Settings> {
        let map: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_environment(Environment::default().source(Some(map)))
    }

    #[test]
    fn test_defaults() {
        let settings = from_vars(&[]).unwrap();

        assert_eq!(settings.symbol, "BTCUSDT");
        assert_eq!(settings.trade_usd, Decimal::TEN);
        assert!(settings.testnet);
        assert_eq!(settings.network(), Network::Testnet);
        assert_eq!(settings.kline_interval, KlineInterval::OneMinute);
        assert_eq!(settings.kline_limit, 100);
        assert_eq!((settings.sma_short, settings.sma_long), (10, 50));
        assert_eq!(settings.poll_interval(), Duration::from_secs(25));
        assert_eq!(settings.signal_advance, SignalAdvance::OnSuccess);
        assert!(settings.credentials().is_none());
    }

    #[test]
    fn test_environment_overrides() {
        let settings = from_vars(&[
            ("BINANCE_API_KEY", "key"),
            ("BINANCE_API_SECRET", "secret"),
            ("SYMBOL", "ETHUSDT"),
            ("TRADE_USD", "25.5"),
            ("TESTNET", "false"),
            ("KLINE_INTERVAL", "5m"),
            ("SMA_SHORT", "5"),
            ("SMA_LONG", "20"),
            ("SIGNAL_ADVANCE", "on_detection"),
        ])
        .unwrap();

        assert_eq!(settings.symbol, "ETHUSDT");
        assert_eq!(settings.trade_usd, Decimal::from_str("25.5").unwrap());
        assert_eq!(settings.network(), Network::Live);
        assert_eq!(settings.kline_interval, KlineInterval::FiveMinutes);
        assert_eq!(settings.strategy().short_period(), 5);
        assert_eq!(settings.strategy().long_period(), 20);
        assert_eq!(settings.signal_advance, SignalAdvance::OnDetection);
        assert!(settings.credentials().is_some());
    }

    #[test]
    fn test_numeric_looking_credentials_are_kept_verbatim() {
        let settings = from_vars(&[
            ("BINANCE_API_KEY", "000123456789"),
            ("BINANCE_API_SECRET", "1e10"),
        ])
        .unwrap();

        assert_eq!(settings.binance_api_key.as_deref(), Some("000123456789"));
        assert_eq!(settings.binance_api_secret.as_deref(), Some("1e10"));
    }

    #[test]
    fn test_empty_credentials_are_ignored() {
        let settings = from_vars(&[("BINANCE_API_KEY", ""), ("BINANCE_API_SECRET", "")]).unwrap();
        assert!(settings.credentials().is_none());
    }

    #[test]
    fn test_rejects_inverted_windows() {
        let result = from_vars(&[("SMA_SHORT", "50"), ("SMA_LONG", "10")]);
        assert!(matches!(result, Err(BotError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_limit_too_small_for_long_window() {
        let result = from_vars(&[("KLINE_LIMIT", "50")]);
        assert!(matches!(result, Err(BotError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_non_positive_notional() {
        let result = from_vars(&[("TRADE_USD", "0")]);
        assert!(matches!(result, Err(BotError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_unknown_interval() {
        let result = from_vars(&[("KLINE_INTERVAL", "7m")]);
        assert!(matches!(result, Err(BotError::Config(_))));
    }

    #[test]
    fn test_default_struct_is_valid() {
        assert!(Settings::default().validate().is_ok());
    }
}
