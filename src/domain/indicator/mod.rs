//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters (serves as HashMap key)
//! - `IndicatorSeries`: A time series of indicator values
//!
//! Every series has one point per input bar. Points whose window is not yet
//! satisfied are marked invalid and carry the indicator's neutral sentinel
//! (0, 50 or -50) rather than a partial reading.
//!
//! [`factors::compute_factors`] assembles the per-bar [`factors::FactorVector`]
//! from the individual series.

pub mod atr;
pub mod bollinger;
pub mod cci;
pub mod ema;
pub mod factors;
pub mod kdj;
pub mod macd;
pub mod momentum;
pub mod obv;
pub mod rsi;
pub mod sma;
pub mod volatility;
pub mod volume;
pub mod williams_r;

pub use factors::{compute_factors, FactorName, FactorVector, MIN_FACTOR_BARS};

use chrono::NaiveDate;
use std::fmt;

use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
        width: f64,
        position: f64,
    },
    Kdj {
        k: f64,
        d: f64,
        j: f64,
    },
}

impl IndicatorValue {
    /// The scalar reading of a single-valued indicator.
    pub fn simple(&self) -> Option<f64> {
        match self {
            IndicatorValue::Simple(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Momentum(usize),
    Volatility(usize),
    Rsi(usize),
    Atr(usize),
    Cci(usize),
    WilliamsR(usize),
    Obv,
    VolumeSma(usize),
    VolumeRatio(usize),
    Kdj(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Build a series from per-bar readings, substituting `sentinel` for
    /// bars whose reading is `None`.
    pub fn from_readings(
        indicator_type: IndicatorType,
        bars: &[OhlcvBar],
        readings: impl IntoIterator<Item = Option<f64>>,
        sentinel: f64,
    ) -> Self {
        let values = bars
            .iter()
            .zip(readings)
            .map(|(bar, reading)| IndicatorPoint {
                date: bar.date,
                valid: reading.is_some(),
                value: IndicatorValue::Simple(reading.unwrap_or(sentinel)),
            })
            .collect();
        IndicatorSeries {
            indicator_type,
            values,
        }
    }

    /// Scalar value at `index`, or `default` if out of range or not scalar.
    pub fn simple_at(&self, index: usize, default: f64) -> f64 {
        self.values
            .get(index)
            .and_then(|p| p.value.simple())
            .unwrap_or(default)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Momentum(period) => write!(f, "MOMENTUM({})", period),
            IndicatorType::Volatility(period) => write!(f, "VOLATILITY({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Cci(period) => write!(f, "CCI({})", period),
            IndicatorType::WilliamsR(period) => write!(f, "WILLIAMS_R({})", period),
            IndicatorType::Obv => write!(f, "OBV"),
            IndicatorType::VolumeSma(period) => write!(f, "VOLUME_SMA({})", period),
            IndicatorType::VolumeRatio(period) => write!(f, "VOLUME_RATIO({})", period),
            IndicatorType::Kdj(period) => write!(f, "KDJ({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}
