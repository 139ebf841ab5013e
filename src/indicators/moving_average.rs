/// Calculate Simple Moving Average (SMA) over the most recent `period` prices
pub fn calculate_sma(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }

    let sum: f64 = prices.iter().rev().take(period).sum();
    Some(sum / period as f64)
}

/// Rolling SMA aligned to `prices`
///
/// Position `i` holds the mean of `prices[i + 1 - period..=i]`. The first
/// `period - 1` positions are `None` because the window is not full yet.
pub fn sma_series(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; prices.len()];
    }

    let warmup = (period - 1).min(prices.len());
    let mut series = vec![None; warmup];
    series.extend(
        prices
            .windows(period)
            .map(|window| Some(window.iter().sum::<f64>() / period as f64)),
    );
    series
}
