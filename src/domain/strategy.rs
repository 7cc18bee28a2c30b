//! Trading policies and their configuration record.
//!
//! A policy only ever sees the bars up to and including the bar being
//! decided, through [`PolicyContext`].

use std::collections::BTreeMap;
use std::fmt;

use super::error::EquitylabError;
use super::indicator_helpers::{prior_highest_high, prior_lowest_low, rsi_at, sma_at};
use super::ohlcv::OhlcvBar;

pub const MA_CROSSOVER: &str = "ma_crossover";
pub const BREAKOUT: &str = "breakout";
pub const RSI_REVERSION: &str = "rsi_reversion";

pub const POLICY_NAMES: [&str; 3] = [MA_CROSSOVER, BREAKOUT, RSI_REVERSION];

/// Point-in-time view handed to a policy.
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    history: &'a [OhlcvBar],
}

impl<'a> PolicyContext<'a> {
    /// View of `bars` as of `index`. Returns `None` if `index` is out of range.
    pub fn new(bars: &'a [OhlcvBar], index: usize) -> Option<Self> {
        bars.get(..=index).map(|history| PolicyContext { history })
    }

    /// Bars up to and including the current one.
    pub fn history(&self) -> &'a [OhlcvBar] {
        self.history
    }

    pub fn index(&self) -> usize {
        self.history.len() - 1
    }

    pub fn bar(&self) -> &'a OhlcvBar {
        &self.history[self.index()]
    }
}

pub trait TradingPolicy: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> String;

    fn parameters(&self) -> BTreeMap<String, f64>;

    fn validate(&self) -> Result<(), EquitylabError>;

    fn should_buy(&self, ctx: &PolicyContext<'_>) -> bool;

    fn should_sell(&self, ctx: &PolicyContext<'_>) -> bool;
}

/// Fast/slow simple moving average crossover.
#[derive(Debug, Clone, PartialEq)]
pub struct MaCrossover {
    pub fast: usize,
    pub slow: usize,
}

impl MaCrossover {
    /// (fast, slow) at the previous and current bar.
    fn averages(&self, ctx: &PolicyContext<'_>) -> Option<((f64, f64), (f64, f64))> {
        let i = ctx.index();
        if i == 0 {
            return None;
        }
        let bars = ctx.history();
        let prev = (sma_at(bars, i - 1, self.fast)?, sma_at(bars, i - 1, self.slow)?);
        let cur = (sma_at(bars, i, self.fast)?, sma_at(bars, i, self.slow)?);
        Some((prev, cur))
    }
}

impl TradingPolicy for MaCrossover {
    fn name(&self) -> &'static str {
        MA_CROSSOVER
    }

    fn description(&self) -> String {
        format!(
            "Buy when SMA({}) crosses above SMA({}), sell when it crosses below",
            self.fast, self.slow
        )
    }

    fn parameters(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("fast".to_string(), self.fast as f64),
            ("slow".to_string(), self.slow as f64),
        ])
    }

    fn validate(&self) -> Result<(), EquitylabError> {
        if self.fast == 0 {
            return Err(EquitylabError::invalid_configuration(
                "ma_crossover: fast must be positive",
            ));
        }
        if self.fast >= self.slow {
            return Err(EquitylabError::invalid_configuration(format!(
                "ma_crossover: fast ({}) must be less than slow ({})",
                self.fast, self.slow
            )));
        }
        Ok(())
    }

    fn should_buy(&self, ctx: &PolicyContext<'_>) -> bool {
        self.averages(ctx)
            .is_some_and(|((pf, ps), (cf, cs))| pf <= ps && cf > cs)
    }

    fn should_sell(&self, ctx: &PolicyContext<'_>) -> bool {
        self.averages(ctx)
            .is_some_and(|((pf, ps), (cf, cs))| pf >= ps && cf < cs)
    }
}

/// N-bar channel breakout on the prior highs and lows.
#[derive(Debug, Clone, PartialEq)]
pub struct Breakout {
    pub lookback: usize,
}

impl TradingPolicy for Breakout {
    fn name(&self) -> &'static str {
        BREAKOUT
    }

    fn description(&self) -> String {
        format!(
            "Buy above the {n}-bar high, sell below the {n}-bar low",
            n = self.lookback
        )
    }

    fn parameters(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([("lookback".to_string(), self.lookback as f64)])
    }

    fn validate(&self) -> Result<(), EquitylabError> {
        if self.lookback == 0 {
            return Err(EquitylabError::invalid_configuration(
                "breakout: lookback must be positive",
            ));
        }
        Ok(())
    }

    fn should_buy(&self, ctx: &PolicyContext<'_>) -> bool {
        prior_highest_high(ctx.history(), ctx.index(), self.lookback)
            .is_some_and(|high| ctx.bar().close > high)
    }

    fn should_sell(&self, ctx: &PolicyContext<'_>) -> bool {
        prior_lowest_low(ctx.history(), ctx.index(), self.lookback)
            .is_some_and(|low| ctx.bar().close < low)
    }
}

/// Buy oversold, sell overbought.
#[derive(Debug, Clone, PartialEq)]
pub struct RsiReversion {
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl TradingPolicy for RsiReversion {
    fn name(&self) -> &'static str {
        RSI_REVERSION
    }

    fn description(&self) -> String {
        format!(
            "Buy when RSI({}) < {}, sell when RSI > {}",
            self.period, self.oversold, self.overbought
        )
    }

    fn parameters(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("overbought".to_string(), self.overbought),
            ("oversold".to_string(), self.oversold),
            ("period".to_string(), self.period as f64),
        ])
    }

    fn validate(&self) -> Result<(), EquitylabError> {
        if self.period == 0 {
            return Err(EquitylabError::invalid_configuration(
                "rsi_reversion: period must be positive",
            ));
        }
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !in_range(self.oversold) || !in_range(self.overbought) {
            return Err(EquitylabError::invalid_configuration(
                "rsi_reversion: thresholds must be within [0, 100]",
            ));
        }
        if self.oversold >= self.overbought {
            return Err(EquitylabError::invalid_configuration(format!(
                "rsi_reversion: oversold ({}) must be below overbought ({})",
                self.oversold, self.overbought
            )));
        }
        Ok(())
    }

    fn should_buy(&self, ctx: &PolicyContext<'_>) -> bool {
        rsi_at(ctx.history(), ctx.index(), self.period).is_some_and(|rsi| rsi < self.oversold)
    }

    fn should_sell(&self, ctx: &PolicyContext<'_>) -> bool {
        rsi_at(ctx.history(), ctx.index(), self.period).is_some_and(|rsi| rsi > self.overbought)
    }
}

/// Policy name plus numeric parameters, as read from configuration.
/// Missing parameters take the policy's defaults.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrategyConfig {
    pub policy: String,
    pub params: BTreeMap<String, f64>,
}

impl StrategyConfig {
    pub fn new(policy: impl Into<String>) -> Self {
        StrategyConfig {
            policy: policy.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: f64) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

/// Parameter keys accepted by each policy.
pub fn policy_keys(policy: &str) -> Option<&'static [&'static str]> {
    match policy {
        MA_CROSSOVER => Some(&["fast", "slow"]),
        BREAKOUT => Some(&["lookback"]),
        RSI_REVERSION => Some(&["period", "oversold", "overbought"]),
        _ => None,
    }
}

fn window_param(
    config: &StrategyConfig,
    key: &str,
    default: usize,
) -> Result<usize, EquitylabError> {
    let Some(&value) = config.params.get(key) else {
        return Ok(default);
    };
    if !value.is_finite() || value < 1.0 || value.fract() != 0.0 {
        return Err(EquitylabError::invalid_configuration(format!(
            "{}: {key} must be a positive whole number, got {value}",
            config.policy
        )));
    }
    Ok(value as usize)
}

fn level_param(config: &StrategyConfig, key: &str, default: f64) -> Result<f64, EquitylabError> {
    let value = config.params.get(key).copied().unwrap_or(default);
    if !value.is_finite() {
        return Err(EquitylabError::invalid_configuration(format!(
            "{}: {key} must be finite",
            config.policy
        )));
    }
    Ok(value)
}

/// Turn a configuration record into a validated policy.
pub fn build_policy(config: &StrategyConfig) -> Result<Box<dyn TradingPolicy>, EquitylabError> {
    let name = config.policy.trim().to_ascii_lowercase();
    let keys = policy_keys(&name).ok_or_else(|| {
        EquitylabError::invalid_configuration(format!(
            "unknown policy '{}' (expected one of: {})",
            config.policy,
            POLICY_NAMES.join(", ")
        ))
    })?;

    if let Some(unknown) = config.params.keys().find(|k| !keys.contains(&k.as_str())) {
        return Err(EquitylabError::invalid_configuration(format!(
            "{name}: unknown parameter '{unknown}'"
        )));
    }

    let policy: Box<dyn TradingPolicy> = match name.as_str() {
        MA_CROSSOVER => Box::new(MaCrossover {
            fast: window_param(config, "fast", 5)?,
            slow: window_param(config, "slow", 20)?,
        }),
        BREAKOUT => Box::new(Breakout {
            lookback: window_param(config, "lookback", 20)?,
        }),
        _ => Box::new(RsiReversion {
            period: window_param(config, "period", 14)?,
            oversold: level_param(config, "oversold", 30.0)?,
            overbought: level_param(config, "overbought", 70.0)?,
        }),
    };

    policy.validate()?;
    Ok(policy)
}
