//! Momentum (rate of change, in percent).
//!
//! MOMENTUM(n)[i] = (C[i] - C[i-n]) / C[i-n] * 100, defined once i >= n.
//! A zero reference close reads 0.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn momentum_at(bars: &[OhlcvBar], index: usize, period: usize) -> Option<f64> {
    if period == 0 || index >= bars.len() || index < period {
        return None;
    }
    let reference = bars[index - period].close;
    if reference == 0.0 {
        return Some(0.0);
    }
    Some((bars[index].close - reference) / reference * 100.0)
}

pub fn calculate_momentum(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let readings = (0..bars.len()).map(|i| momentum_at(bars, i, period));
    IndicatorSeries::from_readings(IndicatorType::Momentum(period), bars, readings, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<OhlcvBar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                date: NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
            })
            .collect()
    }

    #[test]
    fn momentum_warmup() {
        let bars = make_bars(&[100.0, 105.0, 110.0]);
        let series = calculate_momentum(&bars, 2);
        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
    }

    #[test]
    fn momentum_percent_change() {
        let bars = make_bars(&[100.0, 105.0, 110.0, 99.0]);
        let series = calculate_momentum(&bars, 2);
        assert!((series.simple_at(2, 0.0) - 10.0).abs() < 1e-9);
        // (99 - 105) / 105 * 100
        let expected = (99.0 - 105.0) / 105.0 * 100.0;
        assert!((series.simple_at(3, 0.0) - expected).abs() < 1e-9);
    }

    #[test]
    fn momentum_zero_reference_guarded() {
        let bars = make_bars(&[0.0, 5.0]);
        assert_eq!(momentum_at(&bars, 1, 1), Some(0.0));
    }
}
