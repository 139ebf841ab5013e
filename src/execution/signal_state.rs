use crate::models::{Side, Signal};
use serde::Deserialize;

/// Last crossover direction acted on
///
/// Lives only in memory: a restart begins again from `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignalState {
    #[default]
    Idle,
    HoldingBuy,
    HoldingSell,
}

/// When a detected edge moves the state forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalAdvance {
    /// Only after the exchange accepted the order
    #[default]
    OnSuccess,
    /// As soon as the edge is acted on, whether or not an order went through
    OnDetection,
}

impl SignalState {
    /// Side to trade for `signal`, or `None` if it is a hold or repeats the
    /// direction already held
    pub fn actionable(self, signal: Signal) -> Option<Side> {
        let side = signal.side()?;
        if self.holds(side) {
            None
        } else {
            Some(side)
        }
    }

    pub fn holds(self, side: Side) -> bool {
        matches!(
            (self, side),
            (SignalState::HoldingBuy, Side::Buy) | (SignalState::HoldingSell, Side::Sell)
        )
    }

    /// State after acting on `side`
    pub fn after(self, side: Side) -> Self {
        match side {
            Side::Buy => SignalState::HoldingBuy,
            Side::Sell => SignalState::HoldingSell,
        }
    }

    pub fn last_side(self) -> Option<Side> {
        match self {
            SignalState::Idle => None,
            SignalState::HoldingBuy => Some(Side::Buy),
            SignalState::HoldingSell => Some(Side::Sell),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed edges through the state machine, assuming every order succeeds
    fn order_positions(edges: &[Signal]) -> Vec<usize> {
        let mut state = SignalState::default();
        let mut orders = Vec::new();

        for (i, &edge) in edges.iter().enumerate() {
            if let Some(side) = state.actionable(edge) {
                orders.push(i + 1);
                state = state.after(side);
            }
        }

        orders
    }

    #[test]
    fn test_duplicate_buy_is_suppressed() {
        let edges = [Signal::Buy, Signal::Buy, Signal::Sell, Signal::Buy];
        assert_eq!(order_positions(&edges), vec![1, 3, 4]);
    }

    #[test]
    fn test_holds_are_ignored() {
        let edges = [Signal::Hold, Signal::Sell, Signal::Hold, Signal::Sell, Signal::Buy];
        assert_eq!(order_positions(&edges), vec![2, 5]);
    }

    #[test]
    fn test_transitions() {
        let idle = SignalState::Idle;
        assert_eq!(idle.actionable(Signal::Buy), Some(Side::Buy));
        assert_eq!(idle.actionable(Signal::Sell), Some(Side::Sell));
        assert_eq!(idle.actionable(Signal::Hold), None);

        assert_eq!(idle.after(Side::Buy), SignalState::HoldingBuy);
        assert_eq!(SignalState::HoldingBuy.after(Side::Sell), SignalState::HoldingSell);
        assert_eq!(SignalState::HoldingSell.after(Side::Buy), SignalState::HoldingBuy);

        assert_eq!(SignalState::HoldingBuy.actionable(Signal::Buy), None);
        assert_eq!(SignalState::HoldingSell.actionable(Signal::Sell), None);
    }

    #[test]
    fn test_default_state_and_policy() {
        assert_eq!(SignalState::default(), SignalState::Idle);
        assert_eq!(SignalState::default().last_side(), None);
        assert_eq!(SignalAdvance::default(), SignalAdvance::OnSuccess);
    }
}
