// Market data, order sizing and the trading loop
pub mod backoff;
pub mod executor;
pub mod market_data;
pub mod signal_state;
pub mod sizing;
pub mod trader;

pub use backoff::Backoff;
pub use executor::{ExecutionAction, ExecutionDecision, Executor, OrderOutcome};
pub use market_data::MarketFeed;
pub use signal_state::{SignalAdvance, SignalState};
pub use sizing::{order_quantity, quantize, size_order};
pub use trader::{CycleOutcome, Trader};
