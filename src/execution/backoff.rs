use std::time::Duration;

/// Delay before retrying after a failed cycle
///
/// Starts at `initial` and doubles on every consecutive failure up to `max`.
/// With `initial == max` the delay is constant.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let max = max.max(initial);
        Self {
            initial,
            max,
            current: initial,
        }
    }

    pub fn fixed(delay: Duration) -> Self {
        Self::new(delay, delay)
    }

    /// Delay for this failure; advances the schedule
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }

    /// Back to the initial delay after a successful cycle
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}
