use std::time::Duration;

use crate::api::Exchange;
use crate::config::Settings;
use crate::execution::{
    Backoff, ExecutionAction, Executor, MarketFeed, OrderOutcome, SignalAdvance, SignalState,
};
use crate::models::Side;
use crate::strategy::{SmaCrossoverStrategy, Strategy};
use crate::Result;

/// What one pass through the loop did
#[derive(Debug)]
pub enum CycleOutcome {
    /// Not enough bars for both averages at the previous bar
    InsufficientData { candles: usize, required: usize },
    /// No crossover at the latest bar
    NoSignal,
    /// Crossover in the direction already held
    Duplicate(Side),
    /// Crossover acted on
    Traded { side: Side, outcome: OrderOutcome },
}

/// Owns the exchange handle and the signal state carried between cycles
pub struct Trader<E: Exchange> {
    exchange: E,
    feed: MarketFeed,
    strategy: SmaCrossoverStrategy,
    executor: Executor,
    state: SignalState,
    advance: SignalAdvance,
    poll_interval: Duration,
    backoff: Backoff,
}

impl<E: Exchange> Trader<E> {
    pub fn new(exchange: E, settings: &Settings) -> Self {
        Self {
            exchange,
            feed: settings.feed(),
            strategy: settings.strategy(),
            executor: settings.executor(),
            state: SignalState::default(),
            advance: settings.signal_advance,
            poll_interval: settings.poll_interval(),
            backoff: settings.backoff(),
        }
    }

    pub fn state(&self) -> SignalState {
        self.state
    }

    pub fn exchange(&self) -> &E {
        &self.exchange
    }

    /// Poll forever; only process termination stops this
    pub async fn run(mut self) {
        tracing::info!(
            "Bot started for {} ({} bars, {} {}/{}, {} USD per trade)",
            self.feed.symbol(),
            self.feed.interval(),
            self.strategy.name(),
            self.strategy.short_period(),
            self.strategy.long_period(),
            self.executor.notional()
        );

        loop {
            let delay = self.tick().await;
            tokio::time::sleep(delay).await;
        }
    }

    /// Run one cycle, absorbing any error, and return how long to sleep
    pub async fn tick(&mut self) -> Duration {
        match self.run_cycle().await {
            Ok(_) => {
                self.backoff.reset();
                self.poll_interval
            }
            Err(e) => {
                let delay = self.backoff.next_delay();
                if e.is_transport() {
                    tracing::error!("Exchange unreachable: {}. Retrying in {:?}", e, delay);
                } else {
                    tracing::error!("Error: {}. Retrying in {:?}", e, delay);
                }
                delay
            }
        }
    }

    /// Fetch, evaluate and maybe trade once
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        let candles = self.feed.fetch(&self.exchange).await?;

        let Some(signal) = self.strategy.generate_signal(&candles) else {
            let required = self.strategy.min_candles_required();
            tracing::info!(
                "Collecting data... ({}/{} candles needed)",
                candles.len(),
                required
            );
            return Ok(CycleOutcome::InsufficientData {
                candles: candles.len(),
                required,
            });
        };

        let decision = self.executor.process_signal(signal, self.state);
        let side = match (decision.action, signal.side()) {
            (ExecutionAction::Execute { side }, _) => side,
            (ExecutionAction::Skip, Some(side)) => {
                tracing::info!("{}", decision.reason);
                return Ok(CycleOutcome::Duplicate(side));
            }
            (ExecutionAction::Skip, None) => {
                tracing::debug!(symbol = %self.feed.symbol(), "{}", decision.reason);
                return Ok(CycleOutcome::NoSignal);
            }
        };

        tracing::info!("{} on {}", decision.reason, self.feed.symbol());

        let outcome = self.executor.execute(&self.exchange, side).await?;
        if outcome.may_have_filled() || self.advance == SignalAdvance::OnDetection {
            self.state = self.state.after(side);
        }

        Ok(CycleOutcome::Traded { side, outcome })
    }
}

