//! Market data access port.

use crate::domain::error::EquitylabError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily bars for `instrument`, oldest first, restricted to the inclusive
    /// date range. `None` leaves that side of the range open.
    ///
    /// Fails with [`EquitylabError::DataUnavailable`] when the provider has
    /// no usable data for the instrument.
    fn fetch_series(
        &self,
        instrument: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, EquitylabError>;

    /// Identifiers the provider can serve, sorted.
    fn list_instruments(&self) -> Result<Vec<String>, EquitylabError>;
}
