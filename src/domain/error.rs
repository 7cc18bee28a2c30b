//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for equitylab.
#[derive(Debug, thiserror::Error)]
pub enum EquitylabError {
    #[error("insufficient data: have {bars} bars, need {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("data unavailable for {instrument}: {reason}")]
    DataUnavailable { instrument: String, reason: String },

    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("bars out of order at index {index}: {date} does not follow {previous}")]
    UnorderedSeries {
        index: usize,
        date: NaiveDate,
        previous: NaiveDate,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EquitylabError {
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        EquitylabError::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    pub fn data_unavailable(instrument: &str, reason: impl Into<String>) -> Self {
        EquitylabError::DataUnavailable {
            instrument: instrument.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&EquitylabError> for std::process::ExitCode {
    fn from(err: &EquitylabError) -> Self {
        let code: u8 = match err {
            EquitylabError::Io(_) => 1,
            EquitylabError::InvalidConfiguration { .. }
            | EquitylabError::ConfigParse { .. }
            | EquitylabError::ConfigMissing { .. }
            | EquitylabError::ConfigInvalid { .. } => 2,
            EquitylabError::DataUnavailable { .. } | EquitylabError::InsufficientData { .. } => 5,
            EquitylabError::UnorderedSeries { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
