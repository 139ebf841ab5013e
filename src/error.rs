use rust_decimal::Decimal;

/// Everything that can go wrong inside a trading cycle
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// Network, timeout or body decoding failure talking to the exchange
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Exchange answered with a non-success status
    #[error("exchange rejected request (HTTP {status}, code {code}): {msg}")]
    Api { status: u16, code: i64, msg: String },

    #[error("quantity {quantity} is below the exchange minimum {min_qty}")]
    BelowMinimumQuantity { quantity: Decimal, min_qty: Decimal },

    #[error("invalid price {0}")]
    InvalidPrice(Decimal),

    #[error("symbol {0} is not listed on the exchange")]
    UnknownSymbol(String),

    #[error("malformed exchange response: {0}")]
    Decode(String),

    #[error("failed to sign request: {0}")]
    Signing(String),

    #[error("API key and secret are required for signed requests")]
    MissingCredentials,

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BotError {
    /// True for failures of the transport itself rather than the exchange's answer
    pub fn is_transport(&self) -> bool {
        matches!(self, BotError::Transport(_))
    }
}

impl From<rust_decimal::Error> for BotError {
    fn from(e: rust_decimal::Error) -> Self {
        BotError::Decode(e.to_string())
    }
}
