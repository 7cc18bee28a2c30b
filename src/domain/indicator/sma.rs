//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) bars are invalid and
//! read 0.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::sma_at;
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let readings = (0..bars.len()).map(|i| sma_at(bars, i, period));
    IndicatorSeries::from_readings(IndicatorType::Sma(period), bars, readings, 0.0)
}
