//! Risk metrics over a price series or an equity curve.
//!
//! Everything is computed from simple daily returns. Inputs with fewer than
//! [`MIN_RISK_BARS`] values produce an all-zero [`RiskMetrics`], and every
//! ratio whose denominator is zero reads 0 rather than NaN or infinity.

use super::ohlcv::OhlcvBar;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Minimum number of prices (or equity samples) for a non-zero record.
pub const MIN_RISK_BARS: usize = 30;

/// Dispersion at or below this is rounding noise and treated as zero.
const ZERO_TOLERANCE: f64 = 1e-12;

fn snap_to_zero(x: f64) -> f64 {
    if x <= ZERO_TOLERANCE {
        0.0
    } else {
        x
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RiskMetrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    /// One-day 95% value at risk, as a positive loss fraction.
    pub var_95: f64,
    /// One-day 99% value at risk, as a positive loss fraction.
    pub var_99: f64,
    /// Mean loss on days at or beyond the 95% VaR cut.
    pub cvar_95: f64,
    pub max_drawdown: f64,
    /// Longest run of bars spent below a prior peak.
    pub max_drawdown_duration: usize,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    pub skewness: f64,
    /// Excess kurtosis (a normal distribution reads 0).
    pub kurtosis: f64,
    /// Mean return of above-mean days as a percent of the series' own mean
    /// return. This is measured against the series itself, not against a
    /// benchmark index, so it is not a true upside capture ratio.
    pub upside_vs_mean: f64,
    /// Mean return of below-mean days as a percent of the series' own mean
    /// return. Same self-referential caveat as `upside_vs_mean`.
    pub downside_vs_mean: f64,
    pub observations: usize,
}

impl RiskMetrics {
    /// Risk metrics over the closing prices of `bars`.
    pub fn compute(bars: &[OhlcvBar], risk_free_rate: f64) -> Self {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        Self::from_values(&closes, risk_free_rate)
    }

    /// Risk metrics over any value curve (prices or portfolio equity).
    pub fn from_values(values: &[f64], risk_free_rate: f64) -> Self {
        if values.len() < MIN_RISK_BARS {
            return RiskMetrics::default();
        }

        let returns = daily_returns(values);
        let n = returns.len() as f64;

        let first = values[0];
        let last = values[values.len() - 1];
        let total_return = if first > 0.0 {
            (last - first) / first
        } else {
            0.0
        };

        let annualized_return = annualize(total_return, returns.len());

        let mean_return = returns.iter().sum::<f64>() / n;
        let daily_vol = snap_to_zero(stddev_about(&returns, mean_return));
        let annualized_volatility = daily_vol * TRADING_DAYS_PER_YEAR.sqrt();

        let (max_drawdown, max_drawdown_duration) = drawdown_stats(values);

        let excess = annualized_return - risk_free_rate;
        let sharpe_ratio = if annualized_volatility > 0.0 {
            excess / annualized_volatility
        } else {
            0.0
        };

        let downside_deviation = snap_to_zero(downside_deviation(
            &returns,
            risk_free_rate / TRADING_DAYS_PER_YEAR,
        ));
        let sortino_ratio = if downside_deviation > 0.0 {
            excess / downside_deviation
        } else {
            0.0
        };

        let calmar_ratio = if max_drawdown > 0.0 {
            annualized_return / max_drawdown
        } else {
            0.0
        };

        let (skewness, kurtosis) = standardized_moments(&returns, mean_return, daily_vol);
        let (upside_vs_mean, downside_vs_mean) = mean_relative_capture(&returns, mean_return);

        RiskMetrics {
            total_return,
            annualized_return,
            annualized_volatility,
            var_95: value_at_risk(&returns, 0.95),
            var_99: value_at_risk(&returns, 0.99),
            cvar_95: conditional_value_at_risk(&returns, 0.95),
            max_drawdown,
            max_drawdown_duration,
            sharpe_ratio,
            sortino_ratio,
            calmar_ratio,
            skewness,
            kurtosis,
            upside_vs_mean,
            downside_vs_mean,
            observations: values.len(),
        }
    }
}

/// Simple returns between consecutive values; a zero previous value gives 0.
pub fn daily_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| {
            let prev = w[0];
            if prev != 0.0 {
                (w[1] - prev) / prev
            } else {
                0.0
            }
        })
        .collect()
}

fn annualize(total_return: f64, periods: usize) -> f64 {
    if periods == 0 || total_return <= -1.0 {
        return 0.0;
    }
    let years = periods as f64 / TRADING_DAYS_PER_YEAR;
    let annualized = (1.0 + total_return).powf(1.0 / years) - 1.0;
    if annualized.is_finite() { annualized } else { 0.0 }
}

fn stddev_about(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn quantile_index(len: usize, confidence: f64) -> usize {
    let raw = (len as f64 * (1.0 - confidence)).floor();
    (raw.max(0.0) as usize).min(len - 1)
}

fn sorted_ascending(returns: &[f64]) -> Vec<f64> {
    let mut sorted = returns.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Historical one-day value at risk at `confidence` (e.g. 0.95).
///
/// The (1 - confidence) quantile of the sorted returns, taken at index
/// floor(n × (1 - confidence)), negated so a loss reads positive. A quantile
/// that is itself a gain reads 0.
pub fn value_at_risk(returns: &[f64], confidence: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let sorted = sorted_ascending(returns);
    (-sorted[quantile_index(sorted.len(), confidence)]).max(0.0)
}

/// Expected shortfall: mean loss over the returns at or below the VaR cut.
pub fn conditional_value_at_risk(returns: &[f64], confidence: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let sorted = sorted_ascending(returns);
    let tail = &sorted[..=quantile_index(sorted.len(), confidence)];
    let mean_tail = tail.iter().sum::<f64>() / tail.len() as f64;
    (-mean_tail).max(0.0)
}

/// Largest peak-to-trough decline as a fraction of the peak, in [0, 1].
pub fn max_drawdown(values: &[f64]) -> f64 {
    drawdown_stats(values).0
}

fn drawdown_stats(values: &[f64]) -> (f64, usize) {
    let Some(&first) = values.first() else {
        return (0.0, 0);
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    let mut current_duration = 0usize;
    let mut max_duration = 0usize;

    for &value in values {
        if value >= peak {
            peak = value;
            current_duration = 0;
        } else if peak > 0.0 {
            let dd = ((peak - value) / peak).clamp(0.0, 1.0);
            if dd > max_dd {
                max_dd = dd;
            }
            current_duration += 1;
            max_duration = max_duration.max(current_duration);
        }
    }

    (max_dd, max_duration)
}

/// Annualized root-mean-square shortfall below the daily risk-free rate.
/// The mean is taken over all returns, not just the shortfalls.
fn downside_deviation(returns: &[f64], daily_rf: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let shortfall: f64 = returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|&r| (r - daily_rf).powi(2))
        .sum();
    (shortfall / returns.len() as f64).sqrt() * TRADING_DAYS_PER_YEAR.sqrt()
}

fn standardized_moments(returns: &[f64], mean: f64, stddev: f64) -> (f64, f64) {
    if returns.is_empty() || stddev <= ZERO_TOLERANCE {
        return (0.0, 0.0);
    }
    let n = returns.len() as f64;
    let m3 = returns.iter().map(|r| (r - mean).powi(3)).sum::<f64>() / n;
    let m4 = returns.iter().map(|r| (r - mean).powi(4)).sum::<f64>() / n;
    (m3 / stddev.powi(3), m4 / stddev.powi(4) - 3.0)
}

fn mean_relative_capture(returns: &[f64], mean: f64) -> (f64, f64) {
    if mean == 0.0 {
        return (0.0, 0.0);
    }
    let side_mean = |keep: &dyn Fn(f64) -> bool| {
        let side: Vec<f64> = returns.iter().copied().filter(|&r| keep(r)).collect();
        if side.is_empty() {
            0.0
        } else {
            side.iter().sum::<f64>() / side.len() as f64 / mean * 100.0
        }
    };
    (side_mean(&|r| r > mean), side_mean(&|r| r < mean))
}
