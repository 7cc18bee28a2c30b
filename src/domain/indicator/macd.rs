//! MACD (Moving Average Convergence Divergence).
//!
//! - line = EMA(fast) - EMA(slow), both seeded by the first close
//! - signal = EMA(signal) of the line, seeded by the first reported line value
//! - histogram = line - signal
//!
//! The line is reported once the slow window is filled (i >= slow - 1); the
//! signal and histogram once `signal` line values exist
//! (i >= slow + signal - 2). Earlier readings are 0.

use crate::domain::indicator::ema::ema_values;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_macd(
    bars: &[OhlcvBar],
    fast: usize,
    slow: usize,
    signal: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd { fast, slow, signal };

    if fast == 0 || slow == 0 || signal == 0 || bars.len() < slow {
        let values = bars
            .iter()
            .map(|b| IndicatorPoint {
                date: b.date,
                valid: false,
                value: IndicatorValue::Macd {
                    line: 0.0,
                    signal: 0.0,
                    histogram: 0.0,
                },
            })
            .collect();
        return IndicatorSeries {
            indicator_type,
            values,
        };
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let fast_ema = ema_values(&closes, fast);
    let slow_ema = ema_values(&closes, slow);

    let line_start = slow - 1;
    let lines: Vec<f64> = (line_start..bars.len())
        .map(|i| fast_ema[i] - slow_ema[i])
        .collect();
    let signals = ema_values(&lines, signal);

    let mut values = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let point = if i < line_start {
            IndicatorPoint {
                date: bar.date,
                valid: false,
                value: IndicatorValue::Macd {
                    line: 0.0,
                    signal: 0.0,
                    histogram: 0.0,
                },
            }
        } else {
            let offset = i - line_start;
            let line = lines[offset];
            let signal_ready = offset + 1 >= signal;
            let (sig, hist) = if signal_ready {
                (signals[offset], line - signals[offset])
            } else {
                (0.0, 0.0)
            };
            IndicatorPoint {
                date: bar.date,
                valid: signal_ready,
                value: IndicatorValue::Macd {
                    line,
                    signal: sig,
                    histogram: hist,
                },
            }
        };
        values.push(point);
    }

    IndicatorSeries {
        indicator_type,
        values,
    }
}
