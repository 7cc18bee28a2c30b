//! KDJ stochastic oscillator.
//!
//! RSV = (C - LL(n)) / (HH(n) - LL(n)) × 100, 50 when HH == LL.
//! K = 0.67 × 50 + 0.33 × RSV
//! D = 0.67 × 50 + 0.33 × K
//! J = 3K - 2D
//!
//! K and D blend against a neutral 50 on every bar instead of carrying the
//! previous bar's K and D forward, so each reading depends only on the
//! current n-bar window. K and D therefore stay inside [0, 100].
//!
//! Warmup: first (n-1) bars are invalid and read 50 for K, D and J.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::indicator_helpers::high_low_range;
use crate::domain::ohlcv::OhlcvBar;

pub const KDJ_NEUTRAL: f64 = 50.0;
const PRIOR_WEIGHT: f64 = 0.67;
const CURRENT_WEIGHT: f64 = 0.33;

pub fn kdj_at(bars: &[OhlcvBar], index: usize, period: usize) -> Option<(f64, f64, f64)> {
    let (high, low) = high_low_range(bars, index, period)?;
    let rsv = if high > low {
        ((bars[index].close - low) / (high - low) * 100.0).clamp(0.0, 100.0)
    } else {
        KDJ_NEUTRAL
    };
    let k = PRIOR_WEIGHT * KDJ_NEUTRAL + CURRENT_WEIGHT * rsv;
    let d = PRIOR_WEIGHT * KDJ_NEUTRAL + CURRENT_WEIGHT * k;
    let j = 3.0 * k - 2.0 * d;
    Some((k, d, j))
}

pub fn calculate_kdj(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let reading = kdj_at(bars, i, period);
            let (k, d, j) = reading.unwrap_or((KDJ_NEUTRAL, KDJ_NEUTRAL, KDJ_NEUTRAL));
            IndicatorPoint {
                date: bar.date,
                valid: reading.is_some(),
                value: IndicatorValue::Kdj { k, d, j },
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Kdj(period),
        values,
    }
}
