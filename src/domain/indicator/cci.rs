//! CCI (Commodity Channel Index).
//!
//! CCI(n)[i] = (TP[i] - SMA(TP, n)) / (0.015 × MAD(TP, n))
//! where TP is the typical price and MAD the mean absolute deviation from
//! the window mean. Zero deviation reads 0; warmup bars read 0.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::{mean, trailing_window};
use crate::domain::ohlcv::OhlcvBar;

const CCI_CONSTANT: f64 = 0.015;

pub fn cci_at(bars: &[OhlcvBar], index: usize, period: usize) -> Option<f64> {
    let window = trailing_window(bars, index, period)?;
    let typical: Vec<f64> = window.iter().map(|b| b.typical_price()).collect();
    let avg = mean(&typical);
    let mad = typical.iter().map(|tp| (tp - avg).abs()).sum::<f64>() / period as f64;
    if mad == 0.0 {
        return Some(0.0);
    }
    Some((bars[index].typical_price() - avg) / (CCI_CONSTANT * mad))
}

pub fn calculate_cci(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let readings = (0..bars.len()).map(|i| cci_at(bars, i, period));
    IndicatorSeries::from_readings(IndicatorType::Cci(period), bars, readings, 0.0)
}
