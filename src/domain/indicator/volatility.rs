//! Rolling volatility of daily returns.
//!
//! VOLATILITY(n)[i] = population stddev of the n daily returns ending at i,
//! times 100. Not annualized; callers scale by sqrt(252) when they need to.
//! Warmup: the first n bars (n returns need n+1 closes) read 0.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::population_stddev;
use crate::domain::ohlcv::OhlcvBar;

pub fn volatility_at(bars: &[OhlcvBar], index: usize, window: usize) -> Option<f64> {
    if window == 0 || index >= bars.len() || index < window {
        return None;
    }
    let returns: Vec<f64> = (index + 1 - window..=index)
        .map(|i| {
            let prev = bars[i - 1].close;
            if prev == 0.0 {
                0.0
            } else {
                (bars[i].close - prev) / prev
            }
        })
        .collect();
    Some(population_stddev(&returns) * 100.0)
}

pub fn calculate_volatility(bars: &[OhlcvBar], window: usize) -> IndicatorSeries {
    let readings = (0..bars.len()).map(|i| volatility_at(bars, i, window));
    IndicatorSeries::from_readings(IndicatorType::Volatility(window), bars, readings, 0.0)
}
