//! Multi-factor scoring: cross-sectional min-max normalization of the latest
//! factor readings and a weighted composite rank.

use tracing::debug;

use super::error::EquitylabError;
use super::indicator::{compute_factors, FactorName, FactorVector, MIN_FACTOR_BARS};
use super::ohlcv::{ensure_ordered, OhlcvBar};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WeightedFactor {
    pub factor: FactorName,
    pub weight: f64,
}

impl WeightedFactor {
    pub fn new(factor: FactorName, weight: f64) -> Self {
        WeightedFactor { factor, weight }
    }
}

/// Pair a comma-separated factor list with a comma-separated weight list.
pub fn parse_weighted_factors(
    factors: &str,
    weights: &str,
) -> Result<Vec<WeightedFactor>, EquitylabError> {
    let names: Vec<&str> = split_list(factors);
    let values: Vec<&str> = split_list(weights);

    if names.len() != values.len() {
        return Err(EquitylabError::invalid_configuration(format!(
            "{} factors but {} weights",
            names.len(),
            values.len()
        )));
    }

    names
        .iter()
        .zip(&values)
        .map(|(name, value)| -> Result<WeightedFactor, EquitylabError> {
            let factor: FactorName = name.parse()?;
            let weight: f64 = value.parse().map_err(|_| {
                EquitylabError::invalid_configuration(format!(
                    "weight for {factor} is not a number: '{value}'"
                ))
            })?;
            Ok(WeightedFactor { factor, weight })
        })
        .collect()
}

fn split_list(text: &str) -> Vec<&str> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Validate weights and rescale them to sum to 1.
pub fn normalize_weights(
    weighted: &[WeightedFactor],
) -> Result<Vec<WeightedFactor>, EquitylabError> {
    if weighted.is_empty() {
        return Err(EquitylabError::invalid_configuration(
            "at least one factor is required",
        ));
    }
    if let Some(bad) = weighted
        .iter()
        .find(|w| !w.weight.is_finite() || w.weight < 0.0)
    {
        return Err(EquitylabError::invalid_configuration(format!(
            "weight for {} must be a non-negative number, got {}",
            bad.factor, bad.weight
        )));
    }

    let total: f64 = weighted.iter().map(|w| w.weight).sum();
    if total <= 0.0 {
        return Err(EquitylabError::invalid_configuration(
            "factor weights sum to zero",
        ));
    }

    Ok(weighted
        .iter()
        .map(|w| WeightedFactor::new(w.factor, w.weight / total))
        .collect())
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FactorReading {
    pub factor: FactorName,
    pub raw: f64,
    /// Position of `raw` within the batch range, in [0, 1].
    pub normalized: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScoreEntry {
    pub instrument: String,
    pub composite_score: f64,
    /// 1-based.
    pub rank: usize,
    pub readings: Vec<FactorReading>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ExcludedInstrument {
    pub instrument: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScoreBoard {
    /// Best first.
    pub entries: Vec<ScoreEntry>,
    pub excluded: Vec<ExcludedInstrument>,
    /// Weights after renormalization.
    pub weights: Vec<WeightedFactor>,
}

impl ScoreBoard {
    pub fn get(&self, instrument: &str) -> Option<&ScoreEntry> {
        self.entries.iter().find(|e| e.instrument == instrument)
    }
}

fn latest_factors(bars: &[OhlcvBar]) -> Result<FactorVector, EquitylabError> {
    ensure_ordered(bars)?;
    compute_factors(bars)
        .pop()
        .ok_or(EquitylabError::InsufficientData {
            bars: bars.len(),
            minimum: MIN_FACTOR_BARS,
        })
}

/// Rank `instruments` by the weighted composite of their latest factors.
///
/// Weights are validated and renormalized before any series is read.
/// Instruments whose factors cannot be computed are listed in
/// [`ScoreBoard::excluded`] and do not affect the normalization ranges.
pub fn compare(
    instruments: &[(String, Vec<OhlcvBar>)],
    weighted_factors: &[WeightedFactor],
) -> Result<ScoreBoard, EquitylabError> {
    let weights = normalize_weights(weighted_factors)?;

    let mut scored: Vec<(&str, FactorVector)> = Vec::with_capacity(instruments.len());
    let mut excluded = Vec::new();
    for (instrument, bars) in instruments {
        match latest_factors(bars) {
            Ok(latest) => scored.push((instrument.as_str(), latest)),
            Err(err) => {
                let reason = err.to_string();
                debug!(%instrument, %reason, "excluded from scoring");
                excluded.push(ExcludedInstrument {
                    instrument: instrument.clone(),
                    reason,
                });
            }
        }
    }

    let ranges: Vec<(f64, f64)> = weights
        .iter()
        .map(|w| {
            scored.iter().map(|(_, fv)| fv.get(w.factor)).fold(
                (f64::INFINITY, f64::NEG_INFINITY),
                |(lo, hi), v| (lo.min(v), hi.max(v)),
            )
        })
        .collect();

    let mut entries: Vec<ScoreEntry> = scored
        .iter()
        .map(|(instrument, fv)| {
            let readings: Vec<FactorReading> = weights
                .iter()
                .zip(&ranges)
                .map(|(w, &(lo, hi))| {
                    let raw = fv.get(w.factor);
                    let normalized = if hi > lo { (raw - lo) / (hi - lo) } else { 0.5 };
                    FactorReading {
                        factor: w.factor,
                        raw,
                        normalized,
                    }
                })
                .collect();
            let composite_score = readings
                .iter()
                .zip(&weights)
                .map(|(r, w)| r.normalized * w.weight)
                .sum::<f64>()
                * 100.0;
            ScoreEntry {
                instrument: instrument.to_string(),
                composite_score,
                rank: 0,
                readings,
            }
        })
        .collect();

    // stable: ties keep input order
    entries.sort_by(|a, b| b.composite_score.total_cmp(&a.composite_score));
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i + 1;
    }

    Ok(ScoreBoard {
        entries,
        excluded,
        weights,
    })
}
