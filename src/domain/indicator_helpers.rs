//! Shared helper functions for indicator calculations.
//!
//! The `*_at` helpers evaluate a single reading at bar `index` using only
//! `bars[..=index]`. Strategy policies call them directly so that every
//! decision is made without looking past the current bar.

use crate::domain::ohlcv::OhlcvBar;

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by N); 0 for an empty slice.
pub fn population_stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - m;
            diff * diff
        })
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}

/// Trailing window of `period` bars ending at `index`, if available.
pub fn trailing_window(bars: &[OhlcvBar], index: usize, period: usize) -> Option<&[OhlcvBar]> {
    if period == 0 || index >= bars.len() || index + 1 < period {
        return None;
    }
    Some(&bars[index + 1 - period..=index])
}

/// Mean close over the trailing `period` bars ending at `index`.
pub fn sma_at(bars: &[OhlcvBar], index: usize, period: usize) -> Option<f64> {
    let window = trailing_window(bars, index, period)?;
    Some(window.iter().map(|b| b.close).sum::<f64>() / period as f64)
}

/// RSI over the `period` close-to-close changes ending at `index`.
///
/// Averages are simple means over the window. A window with no losses reads
/// 100, except a completely flat window which reads a neutral 50.
pub fn rsi_at(bars: &[OhlcvBar], index: usize, period: usize) -> Option<f64> {
    if period == 0 || index >= bars.len() || index < period {
        return None;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;
    for i in index + 1 - period..=index {
        let change = bars[i].close - bars[i - 1].close;
        if change > 0.0 {
            gains += change;
        } else if change < 0.0 {
            losses -= change;
        }
    }

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    let rsi = if avg_loss == 0.0 {
        if avg_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    };
    Some(rsi.clamp(0.0, 100.0))
}

/// Highest high over the `lookback` bars strictly before `index`.
pub fn prior_highest_high(bars: &[OhlcvBar], index: usize, lookback: usize) -> Option<f64> {
    if lookback == 0 || index >= bars.len() || index < lookback {
        return None;
    }
    bars[index - lookback..index]
        .iter()
        .map(|b| b.high)
        .reduce(f64::max)
}

/// Lowest low over the `lookback` bars strictly before `index`.
pub fn prior_lowest_low(bars: &[OhlcvBar], index: usize, lookback: usize) -> Option<f64> {
    if lookback == 0 || index >= bars.len() || index < lookback {
        return None;
    }
    bars[index - lookback..index]
        .iter()
        .map(|b| b.low)
        .reduce(f64::min)
}

/// (highest high, lowest low) over the trailing window ending at `index`.
pub fn high_low_range(bars: &[OhlcvBar], index: usize, period: usize) -> Option<(f64, f64)> {
    let window = trailing_window(bars, index, period)?;
    let high = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let low = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    Some((high, low))
}
