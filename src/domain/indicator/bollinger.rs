//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//! - Width: (Upper - Lower) / Middle × 100 (0 when Middle is 0)
//! - Position: (Close - Lower) / (Upper - Lower) × 100 (50 when the bands touch)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) bars are invalid; bands and width read 0,
//! position reads 50.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::indicator_helpers::population_stddev;
use crate::domain::ohlcv::OhlcvBar;

pub const NEUTRAL_POSITION: f64 = 50.0;

pub fn calculate_bollinger(
    bars: &[OhlcvBar],
    period: usize,
    stddev_mult_x100: u32,
) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());
    let mult = stddev_mult_x100 as f64 / 100.0;

    for (i, bar) in bars.iter().enumerate() {
        let valid = period > 0 && i + 1 >= period;

        let value = if valid {
            let closes: Vec<f64> = bars[i + 1 - period..=i].iter().map(|b| b.close).collect();
            let middle = closes.iter().sum::<f64>() / period as f64;
            let band = mult * population_stddev(&closes);
            let upper = middle + band;
            let lower = middle - band;

            let width = if middle != 0.0 {
                (upper - lower) / middle * 100.0
            } else {
                0.0
            };
            let position = if upper > lower {
                (bar.close - lower) / (upper - lower) * 100.0
            } else {
                NEUTRAL_POSITION
            };

            IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
                width,
                position,
            }
        } else {
            IndicatorValue::Bollinger {
                upper: 0.0,
                middle: 0.0,
                lower: 0.0,
                width: 0.0,
                position: NEUTRAL_POSITION,
            }
        };

        values.push(IndicatorPoint {
            date: bar.date,
            valid,
            value,
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
        },
        values,
    }
}
