//! Single-instrument analysis: every factor vector plus the risk record.

use super::indicator::{compute_factors, FactorVector};
use super::metrics::RiskMetrics;
use super::ohlcv::OhlcvBar;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Analysis {
    /// One entry per bar; empty for short series.
    pub factors: Vec<FactorVector>,
    pub risk: RiskMetrics,
}

impl Analysis {
    pub fn latest(&self) -> Option<&FactorVector> {
        self.factors.last()
    }
}

pub fn analyze(bars: &[OhlcvBar], risk_free_rate: f64) -> Analysis {
    Analysis {
        factors: compute_factors(bars),
        risk: RiskMetrics::compute(bars, risk_free_rate),
    }
}
