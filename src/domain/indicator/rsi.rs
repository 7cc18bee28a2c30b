//! RSI (Relative Strength Index) indicator implementation.
//!
//! Simple averages of gains and losses over the n close-to-close changes
//! ending at each bar:
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100 (50 when avg_gain is also 0)
//!
//! Warmup: first n bars are invalid (need n price changes) and read 50.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::rsi_at;
use crate::domain::ohlcv::OhlcvBar;

pub const RSI_NEUTRAL: f64 = 50.0;

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let readings = (0..bars.len()).map(|i| rsi_at(bars, i, period));
    IndicatorSeries::from_readings(IndicatorType::Rsi(period), bars, readings, RSI_NEUTRAL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bar(date: &str, close: f64) -> OhlcvBar {
        OhlcvBar {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn rsi_empty_bars() {
        let series = calculate_rsi(&[], 14);
        assert_eq!(series.values.len(), 0);
    }

    #[test]
    fn rsi_single_bar() {
        let bars = vec![make_bar("2024-01-01", 100.0)];
        let series = calculate_rsi(&bars, 14);
        assert_eq!(series.values.len(), 1);
        assert!(!series.values[0].valid);
        assert_eq!(series.simple_at(0, 0.0), RSI_NEUTRAL);
    }

    #[test]
    fn rsi_warmup_period() {
        let bars: Vec<OhlcvBar> = (1..=15)
            .map(|i| {
                let date = format!("2024-01-{:02}", i);
                make_bar(&date, 100.0 + (i as f64 % 5.0) * 2.0)
            })
            .collect();

        let series = calculate_rsi(&bars, 14);

        assert_eq!(series.values.len(), 15);
        for i in 0..14 {
            assert!(!series.values[i].valid, "Bar {} should be invalid", i);
            assert_eq!(series.simple_at(i, 0.0), RSI_NEUTRAL);
        }
        assert!(series.values[14].valid, "Bar 14 should be valid");
    }

    #[test]
    fn rsi_all_gains_no_losses() {
        let bars: Vec<OhlcvBar> = (0..15)
            .map(|i| make_bar(&format!("2024-01-{:02}", i + 1), 100.0 + i as f64))
            .collect();

        let series = calculate_rsi(&bars, 14);
        let rsi = series.simple_at(14, 0.0);
        assert!((rsi - 100.0).abs() < f64::EPSILON, "RSI should be 100 when all gains");
    }

    #[test]
    fn rsi_all_losses_no_gains() {
        let bars: Vec<OhlcvBar> = (0..15)
            .map(|i| make_bar(&format!("2024-01-{:02}", i + 1), 100.0 - i as f64))
            .collect();

        let series = calculate_rsi(&bars, 14);
        let rsi = series.simple_at(14, 50.0);
        assert!(rsi.abs() < f64::EPSILON, "RSI should be 0 when all losses");
    }

    #[test]
    fn rsi_flat_prices_neutral() {
        let bars: Vec<OhlcvBar> = (0..20)
            .map(|i| make_bar(&format!("2024-01-{:02}", i + 1), 100.0))
            .collect();
        let series = calculate_rsi(&bars, 14);
        assert!(series.values[19].valid);
        assert_eq!(series.simple_at(19, 0.0), 50.0);
    }

    #[test]
    fn rsi_in_range() {
        let bars: Vec<OhlcvBar> = (1..=20)
            .map(|i| {
                let close = 100.0 + (i as f64 % 7.0 - 3.0) * 2.0;
                make_bar(&format!("2024-01-{:02}", i), close)
            })
            .collect();

        let series = calculate_rsi(&bars, 14);

        for point in &series.values {
            let rsi = point.value.simple().unwrap();
            assert!((0.0..=100.0).contains(&rsi), "RSI {} out of range", rsi);
        }
    }

    #[test]
    fn rsi_zero_period() {
        let bars = vec![make_bar("2024-01-01", 100.0), make_bar("2024-01-02", 101.0)];
        let series = calculate_rsi(&bars, 0);
        assert_eq!(series.values.len(), 2);
        assert!(series.values.iter().all(|p| !p.valid));
    }

    #[test]
    fn rsi_known_calculation() {
        let closes = [
            44.0, 44.25, 44.50, 43.75, 44.50, 44.25, 44.75, 45.25, 45.50, 45.25, 45.50, 46.0,
            46.25, 46.0, 46.50,
        ];
        let bars: Vec<OhlcvBar> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| make_bar(&format!("2024-01-{:02}", i + 1), c))
            .collect();

        let series = calculate_rsi(&bars, 14);
        assert!(series.values[14].valid);

        // gains: 0.25+0.25+0.75+0.5+0.5+0.25+0.25+0.5+0.25+0.5 = 4.0
        // losses: 0.75+0.25+0.25+0.25 = 1.5
        let expected = 100.0 - 100.0 / (1.0 + 4.0 / 1.5);
        assert!((series.simple_at(14, 0.0) - expected).abs() < 1e-9);
    }
}
