//! Building validated configuration records from a [`ConfigPort`].
//!
//! Every problem is reported against its `[section] key` so the user can
//! find it in the file.

use std::path::PathBuf;

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::EquitylabError;
use crate::domain::scoring::{normalize_weights, parse_weighted_factors, WeightedFactor};
use crate::domain::strategy::{build_policy, policy_keys, StrategyConfig, POLICY_NAMES};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

/// Where to read bars from and which dates to keep.
#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub csv_dir: PathBuf,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> EquitylabError {
    EquitylabError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn missing(section: &str, key: &str) -> EquitylabError {
    EquitylabError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn non_blank(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// A number from the file, or `default` when the key is absent. A value
/// that is present but not numeric is an error rather than the default.
fn read_number(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, EquitylabError> {
    match non_blank(config, section, key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| invalid(section, key, format!("'{raw}' is not a number"))),
    }
}

fn read_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, EquitylabError> {
    non_blank(config, section, key)
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                invalid(section, key, format!("invalid {key} format, expected YYYY-MM-DD"))
            })
        })
        .transpose()
}

pub fn build_data_config(config: &dyn ConfigPort) -> Result<DataConfig, EquitylabError> {
    let csv_dir = non_blank(config, "data", "csv_dir").ok_or_else(|| missing("data", "csv_dir"))?;
    let start_date = read_date(config, "data", "start_date")?;
    let end_date = read_date(config, "data", "end_date")?;

    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(invalid(
                "data",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
    }

    Ok(DataConfig {
        csv_dir: PathBuf::from(csv_dir),
        start_date,
        end_date,
    })
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, EquitylabError> {
    let defaults = BacktestConfig::default();

    let initial_capital = read_number(config, "backtest", "initial_capital", defaults.initial_capital)?;
    if initial_capital <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }

    let fraction = |key: &str, default: f64| -> Result<f64, EquitylabError> {
        let value = read_number(config, "backtest", key, default)?;
        if !(0.0..1.0).contains(&value) {
            return Err(invalid(
                "backtest",
                key,
                format!("{key} must be in [0, 1), got {value}"),
            ));
        }
        Ok(value)
    };
    let fee_rate = fraction("fee_rate", defaults.fee_rate)?;
    let slippage = fraction("slippage", defaults.slippage)?;
    let stop_loss_pct = fraction("stop_loss_pct", defaults.stop_loss_pct)?;

    let position_size = read_number(config, "backtest", "position_size", defaults.position_size)?;
    if position_size <= 0.0 || position_size > 1.0 {
        return Err(invalid(
            "backtest",
            "position_size",
            "position_size must be in (0, 1]",
        ));
    }

    let take_profit_pct =
        read_number(config, "backtest", "take_profit_pct", defaults.take_profit_pct)?;
    if take_profit_pct < 0.0 {
        return Err(invalid(
            "backtest",
            "take_profit_pct",
            "take_profit_pct must be non-negative",
        ));
    }

    Ok(BacktestConfig {
        initial_capital,
        fee_rate,
        slippage,
        position_size,
        stop_loss_pct,
        take_profit_pct,
        compounding: config.get_bool("backtest", "compounding", defaults.compounding),
    })
}

/// Annual risk-free rate as a fraction; defaults to 0.
pub fn read_risk_free_rate(config: &dyn ConfigPort) -> Result<f64, EquitylabError> {
    let value = read_number(config, "backtest", "risk_free_rate", 0.0)?;
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(value)
}

/// Read `[strategy]`, with `policy_override` taking precedence over the
/// file's `policy` key. The record is checked by building the policy once.
pub fn build_strategy_config(
    config: &dyn ConfigPort,
    policy_override: Option<&str>,
) -> Result<StrategyConfig, EquitylabError> {
    let policy = match policy_override {
        Some(name) => name.trim().to_ascii_lowercase(),
        None => non_blank(config, "strategy", "policy")
            .ok_or_else(|| missing("strategy", "policy"))?
            .to_ascii_lowercase(),
    };

    let keys = policy_keys(&policy).ok_or_else(|| {
        invalid(
            "strategy",
            "policy",
            format!(
                "unknown policy '{policy}' (expected one of: {})",
                POLICY_NAMES.join(", ")
            ),
        )
    })?;

    let mut strategy = StrategyConfig::new(policy);
    for key in keys {
        if non_blank(config, "strategy", key).is_some() {
            let value = read_number(config, "strategy", key, 0.0)?;
            strategy = strategy.with_param(*key, value);
        }
    }

    build_policy(&strategy)?;
    Ok(strategy)
}

/// Read `[scoring]`. Without a `weights` key every factor weighs the same.
pub fn build_scoring_config(
    config: &dyn ConfigPort,
) -> Result<Vec<WeightedFactor>, EquitylabError> {
    let factors =
        non_blank(config, "scoring", "factors").ok_or_else(|| missing("scoring", "factors"))?;

    let weights = match non_blank(config, "scoring", "weights") {
        Some(w) => w,
        None => {
            let count = factors.split(',').filter(|s| !s.trim().is_empty()).count();
            vec!["1"; count].join(",")
        }
    };

    let weighted = parse_weighted_factors(&factors, &weights)?;
    normalize_weights(&weighted)?;
    Ok(weighted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use crate::domain::indicator::FactorName;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn valid_data_config_passes() {
        let config = make_config(
            "[data]\ncsv_dir = ./prices\nstart_date = 2020-01-01\nend_date = 2024-12-31\n",
        );
        let data = build_data_config(&config).unwrap();
        assert_eq!(data.csv_dir, PathBuf::from("./prices"));
        assert_eq!(data.start_date, NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(data.end_date, NaiveDate::from_ymd_opt(2024, 12, 31));
    }

    #[test]
    fn data_dates_are_optional() {
        let data = build_data_config(&make_config("[data]\ncsv_dir = d\n")).unwrap();
        assert_eq!(data.start_date, None);
        assert_eq!(data.end_date, None);
    }

    #[test]
    fn missing_csv_dir_fails() {
        let err = build_data_config(&make_config("[data]\nstart_date = 2020-01-01\n")).unwrap_err();
        assert!(matches!(err, EquitylabError::ConfigMissing { key, .. } if key == "csv_dir"));
    }

    #[test]
    fn invalid_start_date_format_fails() {
        let config = make_config("[data]\ncsv_dir = d\nstart_date = 2020/01/01\n");
        let err = build_data_config(&config).unwrap_err();
        assert!(matches!(err, EquitylabError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn start_date_after_end_date_fails() {
        let config = make_config("[data]\ncsv_dir = d\nstart_date = 2024-12-31\nend_date = 2020-01-01\n");
        let err = build_data_config(&config).unwrap_err();
        assert!(matches!(err, EquitylabError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn backtest_defaults_when_section_absent() {
        let built = build_backtest_config(&make_config("[data]\ncsv_dir = d\n")).unwrap();
        assert_eq!(built, BacktestConfig::default());
    }

    #[test]
    fn backtest_config_reads_all_keys() {
        let config = make_config(
            r#"
[backtest]
initial_capital = 50000
fee_rate = 0.0005
slippage = 0.001
position_size = 0.5
stop_loss_pct = 0.08
take_profit_pct = 0.2
compounding = false
"#,
        );
        let built = build_backtest_config(&config).unwrap();
        assert_eq!(built.initial_capital, 50000.0);
        assert_eq!(built.fee_rate, 0.0005);
        assert_eq!(built.slippage, 0.001);
        assert_eq!(built.position_size, 0.5);
        assert_eq!(built.stop_loss_pct, 0.08);
        assert_eq!(built.take_profit_pct, 0.2);
        assert!(!built.compounding);
        assert!(built.validate().is_ok());
    }

    #[test]
    fn initial_capital_must_be_positive() {
        let err = build_backtest_config(&make_config("[backtest]\ninitial_capital = 0\n")).unwrap_err();
        assert!(
            matches!(err, EquitylabError::ConfigInvalid { key, .. } if key == "initial_capital")
        );
    }

    #[test]
    fn non_numeric_value_fails() {
        let err = build_backtest_config(&make_config("[backtest]\nfee_rate = cheap\n")).unwrap_err();
        assert!(matches!(err, EquitylabError::ConfigInvalid { key, .. } if key == "fee_rate"));
    }

    #[test]
    fn fractions_out_of_range_fail() {
        for key in ["fee_rate", "slippage", "stop_loss_pct"] {
            let config = make_config(&format!("[backtest]\n{key} = 1.0\n"));
            let err = build_backtest_config(&config).unwrap_err();
            assert!(
                matches!(&err, EquitylabError::ConfigInvalid { key: k, .. } if k == key),
                "{key}: {err}"
            );
        }
    }

    #[test]
    fn position_size_above_one_fails() {
        let err = build_backtest_config(&make_config("[backtest]\nposition_size = 1.5\n")).unwrap_err();
        assert!(matches!(err, EquitylabError::ConfigInvalid { key, .. } if key == "position_size"));
    }

    #[test]
    fn take_profit_negative_fails() {
        let err =
            build_backtest_config(&make_config("[backtest]\ntake_profit_pct = -0.1\n")).unwrap_err();
        assert!(
            matches!(err, EquitylabError::ConfigInvalid { key, .. } if key == "take_profit_pct")
        );
    }

    #[test]
    fn risk_free_rate_bounds() {
        assert_eq!(read_risk_free_rate(&make_config("[backtest]\n")).unwrap(), 0.0);
        assert_eq!(
            read_risk_free_rate(&make_config("[backtest]\nrisk_free_rate = 0.03\n")).unwrap(),
            0.03
        );
        let err = read_risk_free_rate(&make_config("[backtest]\nrisk_free_rate = 1.5\n")).unwrap_err();
        assert!(
            matches!(err, EquitylabError::ConfigInvalid { key, .. } if key == "risk_free_rate")
        );
    }

    #[test]
    fn strategy_config_reads_policy_params() {
        let config = make_config("[strategy]\npolicy = MA_Crossover\nfast = 10\nslow = 30\nlookback = 99\n");
        let strategy = build_strategy_config(&config, None).unwrap();
        assert_eq!(strategy.policy, "ma_crossover");
        assert_eq!(strategy.params.get("fast"), Some(&10.0));
        assert_eq!(strategy.params.get("slow"), Some(&30.0));
        // lookback belongs to another policy and is not read
        assert!(!strategy.params.contains_key("lookback"));
    }

    #[test]
    fn strategy_override_wins() {
        let config = make_config("[strategy]\npolicy = ma_crossover\nlookback = 15\n");
        let strategy = build_strategy_config(&config, Some("breakout")).unwrap();
        assert_eq!(strategy.policy, "breakout");
        assert_eq!(strategy.params.get("lookback"), Some(&15.0));
    }

    #[test]
    fn missing_policy_fails() {
        let err = build_strategy_config(&make_config("[strategy]\nfast = 5\n"), None).unwrap_err();
        assert!(matches!(err, EquitylabError::ConfigMissing { key, .. } if key == "policy"));
    }

    #[test]
    fn unknown_policy_fails() {
        let err =
            build_strategy_config(&make_config("[strategy]\npolicy = pairs\n"), None).unwrap_err();
        assert!(matches!(err, EquitylabError::ConfigInvalid { key, .. } if key == "policy"));
    }

    #[test]
    fn inconsistent_policy_params_fail() {
        let config = make_config("[strategy]\npolicy = ma_crossover\nfast = 30\nslow = 10\n");
        let err = build_strategy_config(&config, None).unwrap_err();
        assert!(matches!(err, EquitylabError::InvalidConfiguration { .. }));
    }

    #[test]
    fn scoring_config_with_weights() {
        let config = make_config("[scoring]\nfactors = momentum_20, rsi_14\nweights = 3, 1\n");
        let weighted = build_scoring_config(&config).unwrap();
        assert_eq!(weighted.len(), 2);
        assert_eq!(weighted[0].factor, FactorName::Momentum20);
        assert_eq!(weighted[0].weight, 3.0);
    }

    #[test]
    fn scoring_config_equal_weights_by_default() {
        let config = make_config("[scoring]\nfactors = obv,cci_20,atr_14\n");
        let weighted = build_scoring_config(&config).unwrap();
        assert!(weighted.iter().all(|w| w.weight == 1.0));
    }

    #[test]
    fn scoring_config_errors() {
        let missing = build_scoring_config(&make_config("[scoring]\nweights = 1\n")).unwrap_err();
        assert!(matches!(missing, EquitylabError::ConfigMissing { key, .. } if key == "factors"));

        let mismatch =
            build_scoring_config(&make_config("[scoring]\nfactors = obv\nweights = 1,2\n"))
                .unwrap_err();
        assert!(matches!(mismatch, EquitylabError::InvalidConfiguration { .. }));

        let zero =
            build_scoring_config(&make_config("[scoring]\nfactors = obv\nweights = 0\n"))
                .unwrap_err();
        assert!(matches!(zero, EquitylabError::InvalidConfiguration { .. }));
    }
}
