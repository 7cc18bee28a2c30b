//! CSV file data adapter.
//!
//! One file per instrument, `<dir>/<INSTRUMENT>.csv`, with a header row
//! naming `date,open,high,low,close,volume` in any order and case.

use crate::domain::error::EquitylabError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, instrument: &str) -> PathBuf {
        self.base_path.join(format!("{instrument}.csv"))
    }
}

/// Position of each required column in the header.
fn column_indices(
    instrument: &str,
    headers: &csv::StringRecord,
) -> Result<[usize; 6], EquitylabError> {
    let mut indices = [0usize; 6];
    for (slot, name) in indices.iter_mut().zip(COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                EquitylabError::data_unavailable(instrument, format!("missing {name} column"))
            })?;
    }
    Ok(indices)
}

fn field<'r>(
    instrument: &str,
    record: &'r csv::StringRecord,
    index: usize,
    line: u64,
) -> Result<&'r str, EquitylabError> {
    record.get(index).map(str::trim).ok_or_else(|| {
        EquitylabError::data_unavailable(instrument, format!("line {line}: short record"))
    })
}

fn parse_price(
    instrument: &str,
    record: &csv::StringRecord,
    (index, name): (usize, &str),
    line: u64,
) -> Result<f64, EquitylabError> {
    let raw = field(instrument, record, index, line)?;
    let invalid = || {
        EquitylabError::data_unavailable(
            instrument,
            format!("line {line}: invalid {name} value '{raw}'"),
        )
    };
    let price: f64 = raw.parse().map_err(|_| invalid())?;
    // NaN and infinities parse, so check them with the non-positive case
    if !price.is_finite() || price <= 0.0 {
        return Err(invalid());
    }
    Ok(price)
}

impl DataPort for CsvAdapter {
    fn fetch_series(
        &self,
        instrument: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, EquitylabError> {
        let path = self.csv_path(instrument);
        let content = fs::read_to_string(&path).map_err(|e| {
            EquitylabError::data_unavailable(
                instrument,
                format!("failed to read {}: {}", path.display(), e),
            )
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| {
            EquitylabError::data_unavailable(instrument, format!("CSV header error: {e}"))
        })?;
        let [date_col, open_col, high_col, low_col, close_col, volume_col] =
            column_indices(instrument, headers)?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| {
                EquitylabError::data_unavailable(instrument, format!("CSV parse error: {e}"))
            })?;
            let line = record.position().map_or(0, |p| p.line());

            let date_str = field(instrument, &record, date_col, line)?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                EquitylabError::data_unavailable(
                    instrument,
                    format!("line {line}: invalid date '{date_str}': {e}"),
                )
            })?;

            if start.is_some_and(|s| date < s) || end.is_some_and(|e| date > e) {
                continue;
            }

            let volume_str = field(instrument, &record, volume_col, line)?;
            // some exports write volume as a float
            let volume = volume_str
                .parse::<i64>()
                .or_else(|_| volume_str.parse::<f64>().map(|v| v as i64))
                .map_err(|_| {
                    EquitylabError::data_unavailable(
                        instrument,
                        format!("line {line}: invalid volume value '{volume_str}'"),
                    )
                })?;

            let bar = OhlcvBar {
                date,
                open: parse_price(instrument, &record, (open_col, "open"), line)?,
                high: parse_price(instrument, &record, (high_col, "high"), line)?,
                low: parse_price(instrument, &record, (low_col, "low"), line)?,
                close: parse_price(instrument, &record, (close_col, "close"), line)?,
                volume,
            };
            if bar.high < bar.low {
                return Err(EquitylabError::data_unavailable(
                    instrument,
                    format!("line {line}: high {} below low {}", bar.high, bar.low),
                ));
            }
            bars.push(bar);
        }

        bars.sort_by_key(|b| b.date);
        if let Some(pair) = bars.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(EquitylabError::data_unavailable(
                instrument,
                format!("duplicate date {}", pair[1].date),
            ));
        }

        debug!(instrument, bars = bars.len(), path = %path.display(), "loaded series");
        Ok(bars)
    }

    fn list_instruments(&self) -> Result<Vec<String>, EquitylabError> {
        let entries = fs::read_dir(&self.base_path)?;

        let mut instruments = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if !is_csv {
                continue;
            }
            if let Some(stem) = path.file_stem() {
                instruments.push(stem.to_string_lossy().into_owned());
            }
        }

        instruments.sort();
        Ok(instruments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,open,high,low,close,volume\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n";

        fs::write(path.join("BHP.csv"), csv_content).unwrap();
        fs::write(path.join("CBA.csv"), "date,open,high,low,close,volume\n").unwrap();
        fs::write(path.join("notes.txt"), "not data").unwrap();

        (dir, path)
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn fetch_series_sorts_and_parses() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_series("BHP", None, None).unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, date(15));
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].high, 110.0);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[0].volume, 50000);
        assert_eq!(bars[2].date, date(17));
    }

    #[test]
    fn fetch_series_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter
            .fetch_series("BHP", Some(date(16)), Some(date(16)))
            .unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, date(16));

        let bars = adapter.fetch_series("BHP", Some(date(16)), None).unwrap();
        assert_eq!(bars.len(), 2);
    }

    #[test]
    fn fetch_series_header_order_and_case() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("XYZ.csv"),
            "Volume,Close,Low,High,Open,Date\n1200,10.5,9.5,11.0,10.0,2024-03-01\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());

        let bars = adapter.fetch_series("XYZ", None, None).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].open, 10.0);
        assert_eq!(bars[0].close, 10.5);
        assert_eq!(bars[0].volume, 1200);
    }

    #[test]
    fn fetch_series_missing_file_is_unavailable() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let err = adapter.fetch_series("XYZ", None, None).unwrap_err();
        assert!(matches!(err, EquitylabError::DataUnavailable { .. }));
    }

    #[test]
    fn fetch_series_missing_column() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("ABC.csv"),
            "date,open,high,low,close\n2024-01-02,1,1,1,1\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());

        let err = adapter.fetch_series("ABC", None, None).unwrap_err();
        assert!(err.to_string().contains("missing volume column"));
    }

    #[test]
    fn fetch_series_rejects_duplicate_dates() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("DUP.csv"),
            "date,open,high,low,close,volume\n\
             2024-01-02,1,1,1,1,10\n\
             2024-01-02,2,2,2,2,20\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());

        let err = adapter.fetch_series("DUP", None, None).unwrap_err();
        assert!(err.to_string().contains("duplicate date 2024-01-02"));
    }

    #[test]
    fn fetch_series_rejects_bad_number() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("BAD.csv"),
            "date,open,high,low,close,volume\n2024-01-02,1,1,1,n/a,10\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());

        let err = adapter.fetch_series("BAD", None, None).unwrap_err();
        assert!(matches!(err, EquitylabError::DataUnavailable { .. }));
        assert!(err.to_string().contains("'n/a'"));
    }

    fn load_single_row(row: &str) -> Result<Vec<OhlcvBar>, EquitylabError> {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("ROW.csv"),
            format!("date,open,high,low,close,volume\n{row}\n"),
        )
        .unwrap();
        CsvAdapter::new(dir.path().to_path_buf()).fetch_series("ROW", None, None)
    }

    #[test]
    fn fetch_series_rejects_non_finite_and_non_positive_prices() {
        for row in [
            "2024-01-02,1,1,1,NaN,10",
            "2024-01-02,1,inf,1,1,10",
            "2024-01-02,1,1,-inf,1,10",
            "2024-01-02,0,1,1,1,10",
            "2024-01-02,1,1,1,-2.5,10",
        ] {
            let err = load_single_row(row).unwrap_err();
            assert!(
                matches!(err, EquitylabError::DataUnavailable { .. }),
                "{row}: {err}"
            );
            assert!(err.to_string().contains("line 2"), "{row}: {err}");
        }
    }

    #[test]
    fn fetch_series_rejects_high_below_low() {
        let err = load_single_row("2024-01-02,10,9,11,10,10").unwrap_err();
        assert!(matches!(err, EquitylabError::DataUnavailable { .. }));
        assert!(err.to_string().contains("high 9 below low 11"));
    }

    #[test]
    fn fetch_series_accepts_a_zero_range_bar() {
        let bars = load_single_row("2024-01-02,10,10,10,10,0").unwrap();
        assert_eq!(bars.len(), 1);
    }

    #[test]
    fn list_instruments_returns_csv_stems() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let instruments = adapter.list_instruments().unwrap();
        assert_eq!(instruments, vec!["BHP", "CBA"]);
    }
}
