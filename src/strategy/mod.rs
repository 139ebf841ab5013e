// Trading strategy module
pub mod crossover;

pub use crossover::{crossover_edges, detect_crossover, SmaCrossoverStrategy};

use crate::models::{Candle, Signal};

/// Base trait for trading strategies
pub trait Strategy: Send + Sync {
    /// Evaluate the latest bar
    ///
    /// Returns `None` when there is not enough history to decide.
    fn generate_signal(&self, candles: &[Candle]) -> Option<Signal>;

    /// Get strategy name
    fn name(&self) -> &str;

    /// Minimum candles required for this strategy
    fn min_candles_required(&self) -> usize;
}
