use super::Exchange;
use crate::error::BotError;
use crate::models::{Candle, KlineInterval, LotSizeRule, OrderReceipt, Side};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::{Client, Response};
use rust_decimal::Decimal;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use sha2::Sha256;
use std::fmt;
use std::time::Duration;
use url::form_urlencoded;
use uuid::Uuid;

const LIVE_API_BASE: &str = "https://api.binance.com";
const TESTNET_API_BASE: &str = "https://testnet.binance.vision";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RECV_WINDOW_MS: u64 = 5000;

type HmacSha256 = Hmac<Sha256>;

/// Which Binance Spot deployment to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Testnet,
    Live,
}

impl Network {
    pub fn from_testnet_flag(testnet: bool) -> Self {
        if testnet {
            Network::Testnet
        } else {
            Network::Live
        }
    }

    pub fn base_url(self) -> &'static str {
        match self {
            Network::Testnet => TESTNET_API_BASE,
            Network::Live => LIVE_API_BASE,
        }
    }
}

/// API key pair used for signed endpoints
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key_prefix: String = self.api_key.chars().take(4).collect();
        f.debug_struct("Credentials")
            .field("api_key", &format!("{}...", key_prefix))
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Client for the Binance Spot REST API
///
/// Holds one `reqwest::Client` for the lifetime of the process.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
    credentials: Option<Credentials>,
    recv_window_ms: u64,
}

/// `[openTime, open, high, low, close, volume, closeTime, quoteVolume, trades, ...]`
#[derive(Debug, Deserialize)]
struct RawKline(
    i64,
    String,
    String,
    String,
    String,
    String,
    i64,
    IgnoredAny,
    u64,
    IgnoredAny,
    IgnoredAny,
    IgnoredAny,
);

#[derive(Debug, Deserialize)]
struct TickerPrice {
    price: Decimal,
}

#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
struct SymbolInfo {
    symbol: String,
    filters: Vec<SymbolFilter>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "filterType")]
enum SymbolFilter {
    #[serde(rename = "LOT_SIZE")]
    LotSize {
        #[serde(rename = "stepSize")]
        step_size: Decimal,
        #[serde(rename = "minQty")]
        min_qty: Decimal,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderResponse {
    symbol: String,
    order_id: u64,
    client_order_id: String,
    status: String,
    side: Side,
    executed_qty: Decimal,
    #[serde(rename = "cummulativeQuoteQty")]
    cumulative_quote_qty: Decimal,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

/// Hex-encoded HMAC-SHA256 of `payload`, as Binance expects in `signature`
pub fn sign(secret: &str, payload: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| BotError::Signing(e.to_string()))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn parse_f64(field: &str, value: &str) -> Result<f64> {
    value
        .parse()
        .map_err(|_| BotError::Decode(format!("{} is not a number: {:?}", field, value)))
}

fn parse_millis(field: &str, millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| BotError::Decode(format!("{} out of range: {}", field, millis)))
}

impl RawKline {
    fn into_candle(self) -> Result<Candle> {
        Ok(Candle {
            open_time: parse_millis("open time", self.0)?,
            open: parse_f64("open", &self.1)?,
            high: parse_f64("high", &self.2)?,
            low: parse_f64("low", &self.3)?,
            close: parse_f64("close", &self.4)?,
            volume: parse_f64("volume", &self.5)?,
            close_time: parse_millis("close time", self.6)?,
            trades: self.8,
        })
    }
}

impl OrderResponse {
    fn into_receipt(self) -> OrderReceipt {
        OrderReceipt {
            order_id: self.order_id,
            client_order_id: self.client_order_id,
            symbol: self.symbol,
            side: self.side,
            status: self.status,
            executed_qty: self.executed_qty,
            quote_qty: self.cumulative_quote_qty,
        }
    }
}

impl BinanceClient {
    pub fn new(network: Network, credentials: Option<Credentials>) -> Result<Self> {
        Self::with_base_url(network.base_url(), credentials)
    }

    /// Point the client at an arbitrary host (used against local mock servers)
    pub fn with_base_url(
        base_url: impl Into<String>,
        credentials: Option<Credentials>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            recv_window_ms: DEFAULT_RECV_WINDOW_MS,
        })
    }

    pub fn with_recv_window(mut self, recv_window_ms: u64) -> Self {
        self.recv_window_ms = recv_window_ms;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    async fn get_public<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).query(params).send().await?;
        Self::decode(response).await
    }

    async fn post_signed<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(BotError::MissingCredentials)?;

        // the serializer is not Send, keep it out of the await below
        let query = {
            let mut serializer = form_urlencoded::Serializer::new(String::new());
            for (key, value) in params {
                serializer.append_pair(key, value);
            }
            serializer.append_pair("recvWindow", &self.recv_window_ms.to_string());
            serializer.append_pair("timestamp", &Utc::now().timestamp_millis().to_string());
            serializer.finish()
        };

        let signature = sign(&credentials.api_secret, &query)?;
        let url = format!("{}{}?{}&signature={}", self.base_url, path, query, signature);

        let response = self
            .client
            .post(&url)
            .header("X-MBX-APIKEY", &credentials.api_key)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(error) => BotError::Api {
                    status: status.as_u16(),
                    code: error.code,
                    msg: error.msg,
                },
                Err(_) => BotError::Api {
                    status: status.as_u16(),
                    code: -1,
                    msg: body,
                },
            });
        }

        serde_json::from_str(&body).map_err(|e| BotError::Decode(e.to_string()))
    }
}

#[async_trait]
impl Exchange for BinanceClient {
    async fn klines(
        &self,
        symbol: &str,
        interval: KlineInterval,
        limit: u16,
    ) -> Result<Vec<Candle>> {
        let params = [
            ("symbol", symbol.to_string()),
            ("interval", interval.to_string()),
            ("limit", limit.to_string()),
        ];
        let raw: Vec<RawKline> = self.get_public("/api/v3/klines", &params).await?;

        raw.into_iter().map(RawKline::into_candle).collect()
    }

    async fn price(&self, symbol: &str) -> Result<Decimal> {
        let params = [("symbol", symbol.to_string())];
        let ticker: TickerPrice = self.get_public("/api/v3/ticker/price", &params).await?;
        Ok(ticker.price)
    }

    async fn lot_size(&self, symbol: &str) -> Result<Option<LotSizeRule>> {
        let params = [("symbol", symbol.to_string())];
        let info: ExchangeInfo = self.get_public("/api/v3/exchangeInfo", &params).await?;

        let symbol_info = info
            .symbols
            .into_iter()
            .find(|s| s.symbol == symbol)
            .ok_or_else(|| BotError::UnknownSymbol(symbol.to_string()))?;

        Ok(symbol_info.filters.into_iter().find_map(|filter| match filter {
            SymbolFilter::LotSize { step_size, min_qty } => Some(LotSizeRule { step_size, min_qty }),
            SymbolFilter::Other => None,
        }))
    }

    async fn market_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
    ) -> Result<OrderReceipt> {
        let client_order_id = Uuid::new_v4().simple().to_string();
        let params = [
            ("symbol", symbol.to_string()),
            ("side", side.to_string()),
            ("type", "MARKET".to_string()),
            ("quantity", quantity.normalize().to_string()),
            ("newClientOrderId", client_order_id),
        ];

        tracing::debug!(
            symbol = %symbol,
            side = %side,
            quantity = %quantity,
            "Submitting market order"
        );

        let response: OrderResponse = self.post_signed("/api/v3/order", &params).await?;
        Ok(response.into_receipt())
    }
}
