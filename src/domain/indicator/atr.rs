//! ATR (Average True Range).
//!
//! ATR(n)[i] = mean of the n true ranges ending at i, where each true range
//! needs the previous close, so i >= n. Warmup bars read 0.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn atr_at(bars: &[OhlcvBar], index: usize, period: usize) -> Option<f64> {
    if period == 0 || index >= bars.len() || index < period {
        return None;
    }
    let total: f64 = (index + 1 - period..=index)
        .map(|i| bars[i].true_range(bars[i - 1].close))
        .sum();
    Some(total / period as f64)
}

pub fn calculate_atr(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let readings = (0..bars.len()).map(|i| atr_at(bars, i, period));
    IndicatorSeries::from_readings(IndicatorType::Atr(period), bars, readings, 0.0)
}
