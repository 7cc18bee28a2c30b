//! Fill simulation: slippage, proportional fees, whole-share sizing and
//! protective exit triggers.

use chrono::NaiveDate;

use super::backtest::BacktestConfig;
use super::portfolio::{Portfolio, Trade, TradeKind};
use super::position::{Position, RoundTrip, TradeReason};

/// Buy fills are pushed up by the slippage fraction.
pub fn apply_slippage_buy(market_price: f64, slippage: f64) -> f64 {
    market_price * (1.0 + slippage)
}

/// Sell fills are pushed down by the slippage fraction.
pub fn apply_slippage_sell(market_price: f64, slippage: f64) -> f64 {
    market_price * (1.0 - slippage)
}

pub fn calculate_fee(notional: f64, fee_rate: f64) -> f64 {
    notional * fee_rate
}

/// Whole shares affordable with `cash × position_size`, fee included.
pub fn order_quantity(cash: f64, position_size: f64, fill_price: f64, fee_rate: f64) -> i64 {
    let unit_cost = fill_price * (1.0 + fee_rate);
    if unit_cost <= 0.0 || !unit_cost.is_finite() {
        return 0;
    }
    let quantity = (cash * position_size / unit_cost).floor();
    if quantity.is_finite() && quantity > 0.0 {
        quantity as i64
    } else {
        0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered {
        quantity: i64,
        fill_price: f64,
        notional: f64,
        fee: f64,
    },
    InsufficientCapital,
}

/// Open a long position at `market_price` and record the buy.
///
/// Does nothing when a position is already open or the account cannot
/// afford a single share.
pub fn enter_long(
    portfolio: &mut Portfolio,
    date: NaiveDate,
    market_price: f64,
    config: &BacktestConfig,
) -> EntryResult {
    if portfolio.is_long() {
        return EntryResult::InsufficientCapital;
    }

    let fill_price = apply_slippage_buy(market_price, config.slippage);
    let quantity = order_quantity(
        portfolio.cash,
        config.position_size,
        fill_price,
        config.fee_rate,
    );
    if quantity == 0 {
        return EntryResult::InsufficientCapital;
    }

    let notional = quantity as f64 * fill_price;
    let fee = calculate_fee(notional, config.fee_rate);
    if notional + fee > portfolio.cash {
        return EntryResult::InsufficientCapital;
    }
    portfolio.cash -= notional + fee;

    let stop_loss = if config.stop_loss_pct > 0.0 {
        fill_price * (1.0 - config.stop_loss_pct)
    } else {
        0.0
    };
    let take_profit = if config.take_profit_pct > 0.0 {
        fill_price * (1.0 + config.take_profit_pct)
    } else {
        0.0
    };

    portfolio.open(Position {
        quantity,
        entry_price: fill_price,
        entry_date: date,
        entry_fee: fee,
        stop_loss,
        take_profit,
    });
    portfolio.record_trade(Trade {
        date,
        kind: TradeKind::Buy,
        price: fill_price,
        quantity,
        fee,
        reason: TradeReason::Signal,
    });

    EntryResult::Entered {
        quantity,
        fill_price,
        notional,
        fee,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitResult {
    pub quantity: i64,
    pub fill_price: f64,
    pub proceeds: f64,
    pub fee: f64,
    pub pnl: f64,
}

/// Close the open position at `market_price`, recording the sell and the
/// completed round trip. Returns `None` when flat.
pub fn exit_long(
    portfolio: &mut Portfolio,
    date: NaiveDate,
    market_price: f64,
    reason: TradeReason,
    config: &BacktestConfig,
) -> Option<ExitResult> {
    let position = portfolio.close()?;

    let fill_price = apply_slippage_sell(market_price, config.slippage);
    let proceeds = position.quantity as f64 * fill_price;
    let fee = calculate_fee(proceeds, config.fee_rate);
    let pnl = position.quantity as f64 * (fill_price - position.entry_price)
        - position.entry_fee
        - fee;

    portfolio.cash += proceeds - fee;

    portfolio.record_trade(Trade {
        date,
        kind: TradeKind::Sell,
        price: fill_price,
        quantity: position.quantity,
        fee,
        reason,
    });
    portfolio.record_round_trip(RoundTrip {
        quantity: position.quantity,
        entry_price: position.entry_price,
        exit_price: fill_price,
        entry_date: position.entry_date,
        exit_date: date,
        fees: position.entry_fee + fee,
        pnl,
        exit_reason: reason,
    });

    Some(ExitResult {
        quantity: position.quantity,
        fill_price,
        proceeds,
        fee,
        pnl,
    })
}

/// Stop-loss is checked before take-profit.
pub fn check_triggers(position: &Position, price: f64) -> Option<TradeReason> {
    if position.should_stop_loss(price) {
        Some(TradeReason::StopLoss)
    } else if position.should_take_profit(price) {
        Some(TradeReason::TakeProfit)
    } else {
        None
    }
}
