//! Volume measures: average volume and today's volume relative to it.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::trailing_window;
use crate::domain::ohlcv::OhlcvBar;

pub fn volume_sma_at(bars: &[OhlcvBar], index: usize, period: usize) -> Option<f64> {
    let window = trailing_window(bars, index, period)?;
    Some(window.iter().map(|b| b.volume as f64).sum::<f64>() / period as f64)
}

/// volume[i] / VOLUME_SMA(n)[i]; 0 when the average volume is 0.
pub fn volume_ratio_at(bars: &[OhlcvBar], index: usize, period: usize) -> Option<f64> {
    let avg = volume_sma_at(bars, index, period)?;
    if avg == 0.0 {
        return Some(0.0);
    }
    Some(bars[index].volume as f64 / avg)
}

pub fn calculate_volume_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let readings = (0..bars.len()).map(|i| volume_sma_at(bars, i, period));
    IndicatorSeries::from_readings(IndicatorType::VolumeSma(period), bars, readings, 0.0)
}

pub fn calculate_volume_ratio(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let readings = (0..bars.len()).map(|i| volume_ratio_at(bars, i, period));
    IndicatorSeries::from_readings(IndicatorType::VolumeRatio(period), bars, readings, 0.0)
}
