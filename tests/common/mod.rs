#![allow(dead_code)]

use chrono::NaiveDate;
use equitylab::domain::backtest::BacktestConfig;
use equitylab::domain::error::EquitylabError;
pub use equitylab::domain::ohlcv::OhlcvBar;
use equitylab::ports::data_port::DataPort;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, instrument: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(instrument.to_string(), bars);
        self
    }

    pub fn with_error(mut self, instrument: &str, reason: &str) -> Self {
        self.errors.insert(instrument.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_series(
        &self,
        instrument: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, EquitylabError> {
        if let Some(reason) = self.errors.get(instrument) {
            return Err(EquitylabError::data_unavailable(instrument, reason.clone()));
        }
        let bars = self
            .data
            .get(instrument)
            .ok_or_else(|| EquitylabError::data_unavailable(instrument, "unknown instrument"))?;
        Ok(bars
            .iter()
            .filter(|b| start.is_none_or(|s| b.date >= s) && end.is_none_or(|e| b.date <= e))
            .cloned()
            .collect())
    }

    fn list_instruments(&self) -> Result<Vec<String>, EquitylabError> {
        let mut ids: Vec<String> = self.data.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One bar per calendar day starting 2024-01-01, with a ±1 high/low band.
pub fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000,
        })
        .collect()
}

pub fn flat_bars(count: usize, price: f64) -> Vec<OhlcvBar> {
    bars_from_closes(&vec![price; count])
}

/// close[i] = start + i × step
pub fn linear_bars(count: usize, start: f64, step: f64) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..count).map(|i| start + i as f64 * step).collect();
    bars_from_closes(&closes)
}

/// Deterministic oscillation around `base`, enough to trip most policies.
pub fn wave_bars(count: usize, base: f64, amplitude: f64, period: f64) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..count)
        .map(|i| base + amplitude * (i as f64 * std::f64::consts::TAU / period).sin())
        .collect();
    bars_from_closes(&closes)
}

pub fn frictionless_config() -> BacktestConfig {
    BacktestConfig {
        fee_rate: 0.0,
        ..BacktestConfig::default()
    }
}

pub fn write_csv(dir: &Path, instrument: &str, bars: &[OhlcvBar]) {
    let mut file = std::fs::File::create(dir.join(format!("{instrument}.csv"))).unwrap();
    writeln!(file, "date,open,high,low,close,volume").unwrap();
    for b in bars {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            b.date, b.open, b.high, b.low, b.close, b.volume
        )
        .unwrap();
    }
}

pub fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
