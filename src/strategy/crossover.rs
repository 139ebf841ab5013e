use super::Strategy;
use crate::indicators::sma_series;
use crate::models::{Candle, Signal};

/// Dual simple moving average crossover
///
/// Emits `Buy` when the short average moves above the long one between the
/// previous and the latest bar, `Sell` when it moves below, `Hold` otherwise.
#[derive(Debug, Clone)]
pub struct SmaCrossoverStrategy {
    short_period: usize,
    long_period: usize,
}

impl SmaCrossoverStrategy {
    /// Create a strategy; callers guarantee `0 < short_period < long_period`
    pub fn new(short_period: usize, long_period: usize) -> Self {
        Self {
            short_period,
            long_period,
        }
    }

    pub fn short_period(&self) -> usize {
        self.short_period
    }

    pub fn long_period(&self) -> usize {
        self.long_period
    }

    fn extract_prices(candles: &[Candle]) -> Vec<f64> {
        candles.iter().map(|c| c.close).collect()
    }
}

impl Default for SmaCrossoverStrategy {
    fn default() -> Self {
        Self::new(10, 50)
    }
}

impl Strategy for SmaCrossoverStrategy {
    fn generate_signal(&self, candles: &[Candle]) -> Option<Signal> {
        let prices = Self::extract_prices(candles);
        detect_crossover(&prices, self.short_period, self.long_period)
    }

    fn name(&self) -> &str {
        "SmaCrossover"
    }

    fn min_candles_required(&self) -> usize {
        // previous bar needs a full long window too
        self.long_period + 1
    }
}

/// Classify the move between two consecutive (short, long) pairs
fn classify(prev_short: f64, prev_long: f64, short: f64, long: f64) -> Signal {
    if prev_short <= prev_long && short > long {
        Signal::Buy
    } else if prev_short >= prev_long && short < long {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

/// Detect a crossover between the last two bars
///
/// Returns `None` if either average is not ready at the previous bar.
pub fn detect_crossover(prices: &[f64], short_period: usize, long_period: usize) -> Option<Signal> {
    if prices.len() < 2 {
        return None;
    }

    let short = sma_series(prices, short_period);
    let long = sma_series(prices, long_period);
    let last = prices.len() - 1;

    Some(classify(
        short[last - 1]?,
        long[last - 1]?,
        short[last]?,
        long[last]?,
    ))
}

/// Every crossover edge in `prices`, as `(index, signal)` with `index` the
/// bar where the new ordering is first observed
pub fn crossover_edges(
    prices: &[f64],
    short_period: usize,
    long_period: usize,
) -> Vec<(usize, Signal)> {
    let short = sma_series(prices, short_period);
    let long = sma_series(prices, long_period);

    (1..prices.len())
        .filter_map(|i| {
            let signal = classify(short[i - 1]?, long[i - 1]?, short[i]?, long[i]?);
            (signal != Signal::Hold).then_some((i, signal))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn candles_from(prices: &[f64]) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let open_time = start + Duration::minutes(i as i64);
                Candle {
                    open_time,
                    close_time: open_time + Duration::seconds(59),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: 1.0,
                    trades: 1,
                }
            })
            .collect()
    }

    /// Flat at 100, stepping to `after` from index 60 on
    fn step_series(len: usize, after: f64) -> Vec<f64> {
        (0..len).map(|i| if i < 60 { 100.0 } else { after }).collect()
    }

    #[test]
    fn test_insufficient_data_below_long_window() {
        let strategy = SmaCrossoverStrategy::new(10, 50);

        for len in 0..50 {
            let candles = candles_from(&vec![100.0; len]);
            assert_eq!(strategy.generate_signal(&candles), None, "len {}", len);
        }
    }

    #[test]
    fn test_exactly_long_window_is_still_insufficient() {
        // previous bar's long average is not ready yet
        let prices = vec![100.0; 50];
        assert_eq!(detect_crossover(&prices, 10, 50), None);

        let prices = vec![100.0; 51];
        assert_eq!(detect_crossover(&prices, 10, 50), Some(Signal::Hold));
    }

    #[test]
    fn test_single_buy_crossover_at_index_60() {
        let prices = step_series(100, 110.0);
        let edges = crossover_edges(&prices, 10, 50);

        assert_eq!(edges, vec![(60, Signal::Buy)]);
        assert_eq!(edges.iter().filter(|(_, s)| *s == Signal::Sell).count(), 0);
    }

    #[test]
    fn test_single_sell_crossover_at_index_60() {
        let prices = step_series(100, 90.0);
        let edges = crossover_edges(&prices, 10, 50);

        assert_eq!(edges, vec![(60, Signal::Sell)]);
    }

    #[test]
    fn test_latest_bar_buy_edge() {
        let prices = step_series(61, 110.0);
        assert_eq!(detect_crossover(&prices, 10, 50), Some(Signal::Buy));

        // one bar later the short average is still above: no new edge
        let prices = step_series(62, 110.0);
        assert_eq!(detect_crossover(&prices, 10, 50), Some(Signal::Hold));
    }

    #[test]
    fn test_equal_averages_do_not_fire() {
        let prices = vec![100.0; 80];
        assert_eq!(detect_crossover(&prices, 10, 50), Some(Signal::Hold));
        assert!(crossover_edges(&prices, 10, 50).is_empty());
    }

    #[test]
    fn test_touch_from_below_then_cross() {
        // prev short == prev long counts as "at or below"
        assert_eq!(classify(100.0, 100.0, 101.0, 100.0), Signal::Buy);
        assert_eq!(classify(100.0, 100.0, 99.0, 100.0), Signal::Sell);
        assert_eq!(classify(99.0, 100.0, 99.5, 100.0), Signal::Hold);
    }

    #[test]
    fn test_strategy_uses_close_prices() {
        let mut candles = candles_from(&step_series(61, 110.0));
        // open/high/low must not influence the signal
        for candle in &mut candles {
            candle.open = 1.0;
            candle.high = 1_000.0;
            candle.low = 0.5;
        }

        let strategy = SmaCrossoverStrategy::default();
        assert_eq!(strategy.generate_signal(&candles), Some(Signal::Buy));
        assert_eq!(strategy.min_candles_required(), 51);
        assert_eq!(strategy.name(), "SmaCrossover");
    }
}
