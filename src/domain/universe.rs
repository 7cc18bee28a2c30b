//! Instrument lists: parsing them from configuration text and loading their
//! series with skip-and-continue.

use crate::domain::error::EquitylabError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in instrument list")]
    EmptyToken,

    #[error("duplicate instrument: {0}")]
    DuplicateInstrument(String),
}

impl From<UniverseError> for EquitylabError {
    fn from(err: UniverseError) -> Self {
        EquitylabError::invalid_configuration(err.to_string())
    }
}

/// Split a comma-separated list into trimmed, uppercased identifiers.
pub fn parse_instruments(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut instruments = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let instrument = trimmed.to_uppercase();
        if !seen.insert(instrument.clone()) {
            return Err(UniverseError::DuplicateInstrument(instrument));
        }
        instruments.push(instrument);
    }

    Ok(instruments)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    Unavailable(String),
    NoData,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Unavailable(reason) => write!(f, "{reason}"),
            SkipReason::NoData => write!(f, "no bars in range"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedInstrument {
    pub instrument: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default)]
pub struct LoadedUniverse {
    /// In request order.
    pub series: Vec<(String, Vec<OhlcvBar>)>,
    pub skipped: Vec<SkippedInstrument>,
}

impl LoadedUniverse {
    pub fn count(&self) -> usize {
        self.series.len()
    }
}

/// Fetch every instrument, skipping those the provider cannot serve.
///
/// Only `DataUnavailable` and empty series are skipped; any other error
/// aborts the load.
pub fn load_universe(
    data_port: &dyn DataPort,
    instruments: &[String],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<LoadedUniverse, EquitylabError> {
    let mut loaded = LoadedUniverse::default();

    for instrument in instruments {
        let bars = match data_port.fetch_series(instrument, start, end) {
            Ok(bars) => bars,
            Err(EquitylabError::DataUnavailable { reason, .. }) => {
                warn!(%instrument, %reason, "skipping instrument");
                loaded.skipped.push(SkippedInstrument {
                    instrument: instrument.clone(),
                    reason: SkipReason::Unavailable(reason),
                });
                continue;
            }
            Err(e) => return Err(e),
        };

        if bars.is_empty() {
            warn!(%instrument, "skipping instrument: no bars in range");
            loaded.skipped.push(SkippedInstrument {
                instrument: instrument.clone(),
                reason: SkipReason::NoData,
            });
            continue;
        }

        info!(%instrument, bars = bars.len(), "loaded");
        loaded.series.push((instrument.clone(), bars));
    }

    Ok(loaded)
}
