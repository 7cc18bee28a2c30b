//! Backtest engine: a single-position FLAT → LONG → FLAT state machine
//! driven by a [`TradingPolicy`] over one instrument's bars.

use std::collections::BTreeMap;

use tracing::debug;

use super::error::EquitylabError;
use super::execution::{check_triggers, enter_long, exit_long, EntryResult};
use super::metrics::{max_drawdown, RiskMetrics};
use super::ohlcv::{ensure_ordered, OhlcvBar};
use super::portfolio::{EquityPoint, Portfolio, Trade};
use super::position::{Outcome, RoundTrip, TradeReason};
use super::strategy::{PolicyContext, TradingPolicy};

/// Engine parameters. All rates are fractions (0.001 = 0.1%).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BacktestConfig {
    pub initial_capital: f64,
    /// Fee charged on the notional of every buy and sell.
    pub fee_rate: f64,
    pub slippage: f64,
    /// Fraction of available cash committed to each entry.
    pub position_size: f64,
    /// 0 disables the stop.
    pub stop_loss_pct: f64,
    /// 0 disables the target.
    pub take_profit_pct: f64,
    /// When false, cash is reset to the initial capital after every closed
    /// round trip.
    pub compounding: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 100_000.0,
            fee_rate: 0.001,
            slippage: 0.0,
            position_size: 1.0,
            stop_loss_pct: 0.0,
            take_profit_pct: 0.0,
            compounding: true,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), EquitylabError> {
        let fraction = |v: f64| v.is_finite() && (0.0..1.0).contains(&v);

        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(EquitylabError::invalid_configuration(format!(
                "initial_capital must be positive, got {}",
                self.initial_capital
            )));
        }
        if !fraction(self.fee_rate) {
            return Err(EquitylabError::invalid_configuration(format!(
                "fee_rate must be in [0, 1), got {}",
                self.fee_rate
            )));
        }
        if !fraction(self.slippage) {
            return Err(EquitylabError::invalid_configuration(format!(
                "slippage must be in [0, 1), got {}",
                self.slippage
            )));
        }
        if !(self.position_size.is_finite() && self.position_size > 0.0 && self.position_size <= 1.0)
        {
            return Err(EquitylabError::invalid_configuration(format!(
                "position_size must be in (0, 1], got {}",
                self.position_size
            )));
        }
        if !fraction(self.stop_loss_pct) {
            return Err(EquitylabError::invalid_configuration(format!(
                "stop_loss_pct must be in [0, 1), got {}",
                self.stop_loss_pct
            )));
        }
        if !(self.take_profit_pct.is_finite() && self.take_profit_pct >= 0.0) {
            return Err(EquitylabError::invalid_configuration(format!(
                "take_profit_pct must be non-negative, got {}",
                self.take_profit_pct
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    pub round_trips: Vec<RoundTrip>,
    pub equity_curve: Vec<EquityPoint>,
    pub initial_capital: f64,
    pub final_cash: f64,
    pub final_return: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub wins: usize,
    pub losses: usize,
    pub breakevens: usize,
    /// Sum of round-trip P&L net of fees. Unlike `final_return` this is not
    /// affected by the non-compounding cash reset, which also applies to the
    /// final forced liquidation.
    pub realized_pnl: f64,
    pub total_fees: f64,
    pub policy: String,
    pub strategy_description: String,
    pub parameters: BTreeMap<String, f64>,
    pub config: BacktestConfig,
}

impl BacktestResult {
    /// Risk metrics of the equity curve.
    pub fn equity_risk(&self, risk_free_rate: f64) -> RiskMetrics {
        let values: Vec<f64> = self.equity_curve.iter().map(|p| p.equity).collect();
        RiskMetrics::from_values(&values, risk_free_rate)
    }

    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .map_or(self.initial_capital, |p| p.equity)
    }
}

/// Run `policy` over `bars` and return the ledger, equity curve and summary.
///
/// Each bar allows at most one action. While long, stop-loss and
/// take-profit are checked before the policy's sell signal. A position still
/// open after the last bar is closed at its close with reason
/// [`TradeReason::ForcedLiquidation`].
pub fn run_backtest(
    bars: &[OhlcvBar],
    policy: &dyn TradingPolicy,
    config: &BacktestConfig,
) -> Result<BacktestResult, EquitylabError> {
    config.validate()?;
    policy.validate()?;
    ensure_ordered(bars)?;

    let mut portfolio = Portfolio::new(config.initial_capital);

    for (i, bar) in bars.iter().enumerate() {
        let Some(ctx) = PolicyContext::new(bars, i) else {
            break;
        };

        if let Some(position) = portfolio.position.as_ref() {
            let exit_reason = check_triggers(position, bar.close)
                .or_else(|| policy.should_sell(&ctx).then_some(TradeReason::Signal));

            if let Some(reason) = exit_reason {
                if let Some(exit) = exit_long(&mut portfolio, bar.date, bar.close, reason, config) {
                    debug!(
                        date = %bar.date,
                        price = exit.fill_price,
                        quantity = exit.quantity,
                        pnl = exit.pnl,
                        %reason,
                        "sell"
                    );
                    if !config.compounding {
                        portfolio.cash = config.initial_capital;
                    }
                }
            }
        } else if policy.should_buy(&ctx) {
            match enter_long(&mut portfolio, bar.date, bar.close, config) {
                EntryResult::Entered {
                    quantity,
                    fill_price,
                    fee,
                    ..
                } => {
                    debug!(date = %bar.date, price = fill_price, quantity, fee, "buy");
                }
                EntryResult::InsufficientCapital => {
                    debug!(
                        date = %bar.date,
                        cash = portfolio.cash,
                        "buy signal skipped: cannot afford one share"
                    );
                }
            }
        }

        let equity = portfolio.total_equity(bar.close);
        portfolio.record_equity(bar.date, equity);
    }

    if let Some(last) = bars.last() {
        if let Some(exit) = exit_long(
            &mut portfolio,
            last.date,
            last.close,
            TradeReason::ForcedLiquidation,
            config,
        ) {
            debug!(date = %last.date, price = exit.fill_price, pnl = exit.pnl, "forced liquidation");
            if !config.compounding {
                portfolio.cash = config.initial_capital;
            }
            // the final sample reflects the liquidated account
            if let Some(point) = portfolio.equity_curve.last_mut() {
                point.equity = portfolio.cash;
            }
        }
    }

    Ok(summarize(portfolio, policy, config))
}

fn summarize(
    portfolio: Portfolio,
    policy: &dyn TradingPolicy,
    config: &BacktestConfig,
) -> BacktestResult {
    let (mut wins, mut losses, mut breakevens) = (0, 0, 0);
    for rt in &portfolio.round_trips {
        match rt.outcome() {
            Outcome::Win => wins += 1,
            Outcome::Loss => losses += 1,
            Outcome::Breakeven => breakevens += 1,
        }
    }
    let decided = wins + losses;
    let win_rate = if decided > 0 {
        wins as f64 / decided as f64
    } else {
        0.0
    };

    let equity: Vec<f64> = portfolio.equity_curve.iter().map(|p| p.equity).collect();
    let realized_pnl = portfolio.realized_pnl();
    let total_fees = portfolio.total_fees();
    let final_cash = portfolio.cash;

    debug!(
        policy = policy.name(),
        trades = portfolio.trades.len(),
        final_cash,
        "backtest complete"
    );

    BacktestResult {
        final_return: (final_cash - config.initial_capital) / config.initial_capital,
        max_drawdown: max_drawdown(&equity),
        trades: portfolio.trades,
        round_trips: portfolio.round_trips,
        equity_curve: portfolio.equity_curve,
        initial_capital: config.initial_capital,
        final_cash,
        win_rate,
        wins,
        losses,
        breakevens,
        realized_pnl,
        total_fees,
        policy: policy.name().to_string(),
        strategy_description: policy.description(),
        parameters: policy.parameters(),
        config: config.clone(),
    }
}
