use rust_decimal::Decimal;

use crate::api::Exchange;
use crate::error::BotError;
use crate::execution::sizing::order_quantity;
use crate::execution::SignalState;
use crate::models::{OrderReceipt, Side, Signal};
use crate::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionAction {
    Execute { side: Side },
    Skip,
}

#[derive(Debug, Clone)]
pub struct ExecutionDecision {
    pub action: ExecutionAction,
    pub reason: String,
}

/// Result of trying to trade on an edge
#[derive(Debug)]
pub enum OrderOutcome {
    Placed(OrderReceipt),
    /// Notional too small for the symbol's LOT_SIZE; nothing was sent
    BelowMinimum { quantity: Decimal, min_qty: Decimal },
    /// Exchange refused the order
    Failed(BotError),
    /// Request was sent but no answer came back; the order may have filled
    Unconfirmed(BotError),
}

impl OrderOutcome {
    pub fn is_placed(&self) -> bool {
        matches!(self, OrderOutcome::Placed(_))
    }

    /// True unless the exchange definitely did not take the order
    pub fn may_have_filled(&self) -> bool {
        matches!(self, OrderOutcome::Placed(_) | OrderOutcome::Unconfirmed(_))
    }
}

/// Turns crossover signals into fixed-notional market orders for one symbol
pub struct Executor {
    symbol: String,
    notional: Decimal,
}

impl Executor {
    pub fn new(symbol: impl Into<String>, notional: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            notional,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn notional(&self) -> Decimal {
        self.notional
    }

    /// Process a signal and decide what to do
    pub fn process_signal(&self, signal: Signal, state: SignalState) -> ExecutionDecision {
        match (signal, state.actionable(signal)) {
            (Signal::Hold, _) => ExecutionDecision {
                action: ExecutionAction::Skip,
                reason: "No crossover".to_string(),
            },
            (_, Some(side)) => ExecutionDecision {
                action: ExecutionAction::Execute { side },
                reason: match state.last_side() {
                    Some(last) => format!("{} crossover after {}", side, last),
                    None => format!("First {} crossover", side),
                },
            },
            (_, None) => ExecutionDecision {
                action: ExecutionAction::Skip,
                reason: format!("Duplicate {:?} signal, already acted on", signal),
            },
        }
    }

    /// Size and submit a market order
    ///
    /// Price or exchange-info failures while sizing propagate as errors. A
    /// quantity below the lot minimum and a rejected submission are reported
    /// in the outcome instead.
    pub async fn execute<E: Exchange + ?Sized>(
        &self,
        exchange: &E,
        side: Side,
    ) -> Result<OrderOutcome> {
        let quantity = match order_quantity(exchange, &self.symbol, self.notional).await {
            Ok(quantity) => quantity,
            Err(BotError::BelowMinimumQuantity { quantity, min_qty }) => {
                tracing::warn!(
                    "Skipping {} order: quantity {} below minimum {} for {}",
                    side,
                    quantity,
                    min_qty,
                    self.symbol
                );
                return Ok(OrderOutcome::BelowMinimum { quantity, min_qty });
            }
            Err(e) => return Err(e),
        };

        match exchange.market_order(&self.symbol, side, quantity).await {
            Ok(receipt) => {
                tracing::info!(
                    "{} order executed: id={} qty={} quote={} status={}",
                    side,
                    receipt.order_id,
                    receipt.executed_qty,
                    receipt.quote_qty,
                    receipt.status
                );
                Ok(OrderOutcome::Placed(receipt))
            }
            Err(e) if e.is_transport() => {
                tracing::error!(
                    "{} order status unknown, treating as placed: {}",
                    side,
                    e
                );
                Ok(OrderOutcome::Unconfirmed(e))
            }
            Err(e) => {
                tracing::error!("Order failed: {}", e);
                Ok(OrderOutcome::Failed(e))
            }
        }
    }
}
