use crate::api::Exchange;
use crate::models::{Candle, KlineInterval};
use crate::Result;

/// Which bars to pull every cycle
#[derive(Debug, Clone)]
pub struct MarketFeed {
    symbol: String,
    interval: KlineInterval,
    limit: u16,
}

impl MarketFeed {
    pub fn new(symbol: impl Into<String>, interval: KlineInterval, limit: u16) -> Self {
        Self {
            symbol: symbol.into(),
            interval,
            limit,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> KlineInterval {
        self.interval
    }

    pub fn limit(&self) -> u16 {
        self.limit
    }

    /// Fetch the most recent bars, oldest first
    ///
    /// Exchange errors propagate unchanged; nothing is cached between calls.
    pub async fn fetch<E: Exchange + ?Sized>(&self, exchange: &E) -> Result<Vec<Candle>> {
        let candles = exchange
            .klines(&self.symbol, self.interval, self.limit)
            .await?;
        let candles = normalize_candles(candles, self.limit as usize);

        if let Some(latest) = candles.last() {
            tracing::debug!(
                symbol = %self.symbol,
                interval = %self.interval,
                candles = candles.len(),
                close = latest.close,
                "Fetched candles"
            );
        }

        Ok(candles)
    }
}

/// Sort by open time and keep only the newest `limit` bars
fn normalize_candles(mut candles: Vec<Candle>, limit: usize) -> Vec<Candle> {
    if candles.windows(2).any(|w| w[0].open_time > w[1].open_time) {
        tracing::warn!("Candles arrived out of order, sorting by open time");
        candles.sort_by_key(|c| c.open_time);
    }

    if candles.len() > limit {
        let excess = candles.len() - limit;
        candles.drain(..excess);
    }

    candles
}
