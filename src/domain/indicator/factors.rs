//! Per-bar factor vectors: the full indicator readout for each bar.
//!
//! [`compute_factors`] evaluates every indicator family once over the series
//! and zips the readings by bar index. Each reading at index `i` is a pure
//! function of `bars[..=i]`.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

use super::atr::calculate_atr;
use super::bollinger::calculate_bollinger;
use super::cci::calculate_cci;
use super::kdj::calculate_kdj;
use super::macd::calculate_macd;
use super::momentum::calculate_momentum;
use super::obv::calculate_obv;
use super::rsi::{calculate_rsi, RSI_NEUTRAL};
use super::sma::calculate_sma;
use super::volatility::calculate_volatility;
use super::volume::{calculate_volume_ratio, calculate_volume_sma};
use super::williams_r::{calculate_williams_r, WILLIAMS_R_NEUTRAL};
use super::{IndicatorSeries, IndicatorValue};
use crate::domain::error::EquitylabError;
use crate::domain::ohlcv::OhlcvBar;

/// Series shorter than this produce no factor vectors at all.
pub const MIN_FACTOR_BARS: usize = 30;

pub const SMA_WINDOWS: [usize; 5] = [5, 10, 20, 30, 60];
pub const MOMENTUM_PERIODS: [usize; 3] = [5, 10, 20];
pub const VOLATILITY_WINDOW: usize = 20;
pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_MULT_X100: u32 = 200;
pub const KDJ_PERIOD: usize = 9;
pub const WILLIAMS_R_PERIOD: usize = 14;
pub const CCI_PERIOD: usize = 20;
pub const ATR_PERIOD: usize = 14;
pub const VOLUME_PERIOD: usize = 20;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FactorVector {
    pub date: NaiveDate,
    pub close: f64,
    pub sma_5: f64,
    pub sma_10: f64,
    pub sma_20: f64,
    pub sma_30: f64,
    pub sma_60: f64,
    pub momentum_5: f64,
    pub momentum_10: f64,
    pub momentum_20: f64,
    pub volatility_20: f64,
    pub rsi_14: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub boll_upper: f64,
    pub boll_middle: f64,
    pub boll_lower: f64,
    pub boll_width: f64,
    pub boll_position: f64,
    pub kdj_k: f64,
    pub kdj_d: f64,
    pub kdj_j: f64,
    pub williams_r_14: f64,
    pub cci_20: f64,
    pub atr_14: f64,
    pub obv: f64,
    pub volume_sma_20: f64,
    pub volume_ratio: f64,
}

/// Name of one scalar reading in a [`FactorVector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum FactorName {
    Close,
    Sma5,
    Sma10,
    Sma20,
    Sma30,
    Sma60,
    Momentum5,
    Momentum10,
    Momentum20,
    Volatility20,
    Rsi14,
    Macd,
    MacdSignal,
    MacdHistogram,
    BollUpper,
    BollMiddle,
    BollLower,
    BollWidth,
    BollPosition,
    KdjK,
    KdjD,
    KdjJ,
    WilliamsR14,
    Cci20,
    Atr14,
    Obv,
    VolumeSma20,
    VolumeRatio,
}

impl FactorName {
    pub const ALL: [FactorName; 28] = [
        FactorName::Close,
        FactorName::Sma5,
        FactorName::Sma10,
        FactorName::Sma20,
        FactorName::Sma30,
        FactorName::Sma60,
        FactorName::Momentum5,
        FactorName::Momentum10,
        FactorName::Momentum20,
        FactorName::Volatility20,
        FactorName::Rsi14,
        FactorName::Macd,
        FactorName::MacdSignal,
        FactorName::MacdHistogram,
        FactorName::BollUpper,
        FactorName::BollMiddle,
        FactorName::BollLower,
        FactorName::BollWidth,
        FactorName::BollPosition,
        FactorName::KdjK,
        FactorName::KdjD,
        FactorName::KdjJ,
        FactorName::WilliamsR14,
        FactorName::Cci20,
        FactorName::Atr14,
        FactorName::Obv,
        FactorName::VolumeSma20,
        FactorName::VolumeRatio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FactorName::Close => "close",
            FactorName::Sma5 => "sma_5",
            FactorName::Sma10 => "sma_10",
            FactorName::Sma20 => "sma_20",
            FactorName::Sma30 => "sma_30",
            FactorName::Sma60 => "sma_60",
            FactorName::Momentum5 => "momentum_5",
            FactorName::Momentum10 => "momentum_10",
            FactorName::Momentum20 => "momentum_20",
            FactorName::Volatility20 => "volatility_20",
            FactorName::Rsi14 => "rsi_14",
            FactorName::Macd => "macd",
            FactorName::MacdSignal => "macd_signal",
            FactorName::MacdHistogram => "macd_histogram",
            FactorName::BollUpper => "boll_upper",
            FactorName::BollMiddle => "boll_middle",
            FactorName::BollLower => "boll_lower",
            FactorName::BollWidth => "boll_width",
            FactorName::BollPosition => "boll_position",
            FactorName::KdjK => "kdj_k",
            FactorName::KdjD => "kdj_d",
            FactorName::KdjJ => "kdj_j",
            FactorName::WilliamsR14 => "williams_r_14",
            FactorName::Cci20 => "cci_20",
            FactorName::Atr14 => "atr_14",
            FactorName::Obv => "obv",
            FactorName::VolumeSma20 => "volume_sma_20",
            FactorName::VolumeRatio => "volume_ratio",
        }
    }
}

impl fmt::Display for FactorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FactorName {
    type Err = EquitylabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        FactorName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == wanted)
            .ok_or_else(|| EquitylabError::invalid_configuration(format!("unknown factor: {}", s)))
    }
}

impl FactorVector {
    pub fn get(&self, name: FactorName) -> f64 {
        match name {
            FactorName::Close => self.close,
            FactorName::Sma5 => self.sma_5,
            FactorName::Sma10 => self.sma_10,
            FactorName::Sma20 => self.sma_20,
            FactorName::Sma30 => self.sma_30,
            FactorName::Sma60 => self.sma_60,
            FactorName::Momentum5 => self.momentum_5,
            FactorName::Momentum10 => self.momentum_10,
            FactorName::Momentum20 => self.momentum_20,
            FactorName::Volatility20 => self.volatility_20,
            FactorName::Rsi14 => self.rsi_14,
            FactorName::Macd => self.macd,
            FactorName::MacdSignal => self.macd_signal,
            FactorName::MacdHistogram => self.macd_histogram,
            FactorName::BollUpper => self.boll_upper,
            FactorName::BollMiddle => self.boll_middle,
            FactorName::BollLower => self.boll_lower,
            FactorName::BollWidth => self.boll_width,
            FactorName::BollPosition => self.boll_position,
            FactorName::KdjK => self.kdj_k,
            FactorName::KdjD => self.kdj_d,
            FactorName::KdjJ => self.kdj_j,
            FactorName::WilliamsR14 => self.williams_r_14,
            FactorName::Cci20 => self.cci_20,
            FactorName::Atr14 => self.atr_14,
            FactorName::Obv => self.obv,
            FactorName::VolumeSma20 => self.volume_sma_20,
            FactorName::VolumeRatio => self.volume_ratio,
        }
    }
}

/// Compute the factor vector for every bar.
///
/// Returns an empty vector when fewer than [`MIN_FACTOR_BARS`] bars are given.
pub fn compute_factors(bars: &[OhlcvBar]) -> Vec<FactorVector> {
    if bars.len() < MIN_FACTOR_BARS {
        return Vec::new();
    }

    let sma: Vec<IndicatorSeries> = SMA_WINDOWS
        .iter()
        .map(|&w| calculate_sma(bars, w))
        .collect();
    let momentum: Vec<IndicatorSeries> = MOMENTUM_PERIODS
        .iter()
        .map(|&p| calculate_momentum(bars, p))
        .collect();
    let volatility = calculate_volatility(bars, VOLATILITY_WINDOW);
    let rsi = calculate_rsi(bars, RSI_PERIOD);
    let macd = calculate_macd(bars, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
    let bollinger = calculate_bollinger(bars, BOLLINGER_PERIOD, BOLLINGER_MULT_X100);
    let kdj = calculate_kdj(bars, KDJ_PERIOD);
    let williams_r = calculate_williams_r(bars, WILLIAMS_R_PERIOD);
    let cci = calculate_cci(bars, CCI_PERIOD);
    let atr = calculate_atr(bars, ATR_PERIOD);
    let obv = calculate_obv(bars);
    let volume_sma = calculate_volume_sma(bars, VOLUME_PERIOD);
    let volume_ratio = calculate_volume_ratio(bars, VOLUME_PERIOD);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let (macd_line, macd_signal, macd_histogram) = match macd.values[i].value {
                IndicatorValue::Macd {
                    line,
                    signal,
                    histogram,
                } => (line, signal, histogram),
                _ => (0.0, 0.0, 0.0),
            };
            let (boll_upper, boll_middle, boll_lower, boll_width, boll_position) =
                match bollinger.values[i].value {
                    IndicatorValue::Bollinger {
                        upper,
                        middle,
                        lower,
                        width,
                        position,
                    } => (upper, middle, lower, width, position),
                    _ => (0.0, 0.0, 0.0, 0.0, 50.0),
                };
            let (kdj_k, kdj_d, kdj_j) = match kdj.values[i].value {
                IndicatorValue::Kdj { k, d, j } => (k, d, j),
                _ => (50.0, 50.0, 50.0),
            };

            FactorVector {
                date: bar.date,
                close: bar.close,
                sma_5: sma[0].simple_at(i, 0.0),
                sma_10: sma[1].simple_at(i, 0.0),
                sma_20: sma[2].simple_at(i, 0.0),
                sma_30: sma[3].simple_at(i, 0.0),
                sma_60: sma[4].simple_at(i, 0.0),
                momentum_5: momentum[0].simple_at(i, 0.0),
                momentum_10: momentum[1].simple_at(i, 0.0),
                momentum_20: momentum[2].simple_at(i, 0.0),
                volatility_20: volatility.simple_at(i, 0.0),
                rsi_14: rsi.simple_at(i, RSI_NEUTRAL),
                macd: macd_line,
                macd_signal,
                macd_histogram,
                boll_upper,
                boll_middle,
                boll_lower,
                boll_width,
                boll_position,
                kdj_k,
                kdj_d,
                kdj_j,
                williams_r_14: williams_r.simple_at(i, WILLIAMS_R_NEUTRAL),
                cci_20: cci.simple_at(i, 0.0),
                atr_14: atr.simple_at(i, 0.0),
                obv: obv.simple_at(i, 0.0),
                volume_sma_20: volume_sma.simple_at(i, 0.0),
                volume_ratio: volume_ratio.simple_at(i, 0.0),
            }
        })
        .collect()
}
