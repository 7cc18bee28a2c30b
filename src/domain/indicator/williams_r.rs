//! Williams %R.
//!
//! %R = (HH(n) - C) / (HH(n) - LL(n)) × -100, always within [-100, 0].
//! A window with no range reads -50, as do warmup bars.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::high_low_range;
use crate::domain::ohlcv::OhlcvBar;

pub const WILLIAMS_R_NEUTRAL: f64 = -50.0;

pub fn williams_r_at(bars: &[OhlcvBar], index: usize, period: usize) -> Option<f64> {
    let (high, low) = high_low_range(bars, index, period)?;
    if high <= low {
        return Some(WILLIAMS_R_NEUTRAL);
    }
    let value = (high - bars[index].close) / (high - low) * -100.0;
    Some(value.clamp(-100.0, 0.0))
}

pub fn calculate_williams_r(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let readings = (0..bars.len()).map(|i| williams_r_at(bars, i, period));
    IndicatorSeries::from_readings(
        IndicatorType::WilliamsR(period),
        bars,
        readings,
        WILLIAMS_R_NEUTRAL,
    )
}
