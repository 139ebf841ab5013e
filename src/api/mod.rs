pub mod binance;

pub use binance::{BinanceClient, Credentials, Network};

use crate::models::{Candle, KlineInterval, LotSizeRule, OrderReceipt, Side};
use crate::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Exchange operations the trading loop depends on
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Recent candles, oldest first, at most `limit` of them
    async fn klines(
        &self,
        symbol: &str,
        interval: KlineInterval,
        limit: u16,
    ) -> Result<Vec<Candle>>;

    /// Last traded price
    async fn price(&self, symbol: &str) -> Result<Decimal>;

    /// LOT_SIZE rule for the symbol, `None` if the exchange defines none
    async fn lot_size(&self, symbol: &str) -> Result<Option<LotSizeRule>>;

    /// Submit a market order
    async fn market_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
    ) -> Result<OrderReceipt>;
}
