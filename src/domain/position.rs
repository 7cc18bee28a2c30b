//! Open position and closed round-trip records.

use chrono::NaiveDate;
use std::fmt;

/// Why a trade happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TradeReason {
    Signal,
    StopLoss,
    TakeProfit,
    ForcedLiquidation,
}

impl fmt::Display for TradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeReason::Signal => write!(f, "signal"),
            TradeReason::StopLoss => write!(f, "stop-loss"),
            TradeReason::TakeProfit => write!(f, "take-profit"),
            TradeReason::ForcedLiquidation => write!(f, "forced liquidation"),
        }
    }
}

/// A long holding. Only one may be open at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub quantity: i64,
    /// Slippage-adjusted fill price.
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub entry_fee: f64,
    /// Exit at or below this price; 0 disables.
    pub stop_loss: f64,
    /// Exit at or above this price; 0 disables.
    pub take_profit: f64,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity as f64 * price
    }

    pub fn should_stop_loss(&self, price: f64) -> bool {
        self.stop_loss != 0.0 && price <= self.stop_loss
    }

    pub fn should_take_profit(&self, price: f64) -> bool {
        self.take_profit != 0.0 && price >= self.take_profit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
    Breakeven,
}

/// A buy paired with the sell that closed it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundTrip {
    pub quantity: i64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    /// Entry fee plus exit fee.
    pub fees: f64,
    /// Price P&L net of both fees.
    pub pnl: f64,
    pub exit_reason: TradeReason,
}

impl RoundTrip {
    /// Judged on fill prices alone; fees do not turn a win into a loss.
    pub fn outcome(&self) -> Outcome {
        if self.exit_price > self.entry_price {
            Outcome::Win
        } else if self.exit_price < self.entry_price {
            Outcome::Loss
        } else {
            Outcome::Breakeven
        }
    }

    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}
