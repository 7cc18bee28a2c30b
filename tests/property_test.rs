//! Property tests over randomly generated price paths.

mod common;

use common::*;
use equitylab::domain::analysis::analyze;
use equitylab::domain::backtest::{run_backtest, BacktestConfig};
use equitylab::domain::indicator::{compute_factors, FactorName};
use equitylab::domain::metrics::{max_drawdown, RiskMetrics};
use equitylab::domain::portfolio::TradeKind;
use equitylab::domain::position::TradeReason;
use equitylab::domain::scoring::{compare, WeightedFactor};
use equitylab::domain::strategy::{Breakout, MaCrossover, RsiReversion, TradingPolicy};
use proptest::prelude::*;

/// Closes of a random walk starting at 100 with daily moves within ±5%.
fn random_walk(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.05f64..0.05, min_len..max_len).prop_map(|moves| {
        let mut price = 100.0;
        moves
            .into_iter()
            .map(|m| {
                price *= 1.0 + m;
                price
            })
            .collect()
    })
}

fn policies() -> Vec<Box<dyn TradingPolicy>> {
    vec![
        Box::new(MaCrossover { fast: 3, slow: 8 }),
        Box::new(Breakout { lookback: 5 }),
        Box::new(RsiReversion {
            period: 5,
            oversold: 40.0,
            overbought: 60.0,
        }),
    ]
}

proptest! {
    #[test]
    fn short_series_give_empty_results(closes in random_walk(0, 30)) {
        let bars = bars_from_closes(&closes);
        let analysis = analyze(&bars, 0.02);
        prop_assert!(analysis.factors.is_empty());
        prop_assert_eq!(analysis.risk, RiskMetrics::default());
    }

    #[test]
    fn oscillators_stay_in_range(closes in random_walk(30, 150)) {
        let bars = bars_from_closes(&closes);
        for fv in compute_factors(&bars) {
            prop_assert!((0.0..=100.0).contains(&fv.rsi_14), "rsi {}", fv.rsi_14);
            prop_assert!((-100.0..=0.0).contains(&fv.williams_r_14), "%R {}", fv.williams_r_14);
            prop_assert!((0.0..=100.0).contains(&fv.kdj_k), "K {}", fv.kdj_k);
            prop_assert!((0.0..=100.0).contains(&fv.kdj_d), "D {}", fv.kdj_d);
        }
    }

    #[test]
    fn risk_metrics_are_finite(closes in random_walk(30, 200), rf in 0.0f64..0.1) {
        let risk = RiskMetrics::compute(&bars_from_closes(&closes), rf);
        prop_assert!((0.0..=1.0).contains(&risk.max_drawdown));
        prop_assert!(risk.var_95 >= 0.0);
        prop_assert!(risk.var_99 >= risk.var_95);
        for v in [
            risk.annualized_return,
            risk.annualized_volatility,
            risk.sharpe_ratio,
            risk.sortino_ratio,
            risk.calmar_ratio,
            risk.skewness,
            risk.kurtosis,
            risk.upside_vs_mean,
            risk.downside_vs_mean,
        ] {
            prop_assert!(v.is_finite());
        }
    }

    #[test]
    fn drawdown_never_shrinks_when_lower_bars_are_appended(
        closes in random_walk(2, 100),
        drops in prop::collection::vec(0.0f64..0.2, 1..10),
    ) {
        let mut values = closes;
        let mut previous = max_drawdown(&values);
        for drop in drops {
            let floor = values.iter().copied().fold(f64::INFINITY, f64::min);
            values.push(floor * (1.0 - drop));
            let current = max_drawdown(&values);
            prop_assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn every_buy_pairs_with_one_sell(
        closes in random_walk(10, 150),
        stop in 0.0f64..0.2,
        target in 0.0f64..0.3,
        compounding in any::<bool>(),
    ) {
        let bars = bars_from_closes(&closes);
        let config = BacktestConfig {
            stop_loss_pct: stop,
            take_profit_pct: target,
            compounding,
            ..BacktestConfig::default()
        };

        for policy in policies() {
            let result = run_backtest(&bars, policy.as_ref(), &config).unwrap();

            prop_assert_eq!(result.trades.len() % 2, 0);
            for pair in result.trades.chunks(2) {
                prop_assert_eq!(pair[0].kind, TradeKind::Buy);
                prop_assert_eq!(pair[1].kind, TradeKind::Sell);
                prop_assert_eq!(pair[0].quantity, pair[1].quantity);
                prop_assert!(pair[0].date <= pair[1].date);
            }

            let forced: Vec<usize> = result
                .trades
                .iter()
                .enumerate()
                .filter(|(_, t)| t.reason == TradeReason::ForcedLiquidation)
                .map(|(i, _)| i)
                .collect();
            prop_assert!(forced.len() <= 1);
            if let Some(&i) = forced.first() {
                prop_assert_eq!(i, result.trades.len() - 1);
                prop_assert_eq!(result.trades[i].date, bars[bars.len() - 1].date);
            }

            prop_assert_eq!(result.equity_curve.len(), bars.len());
            prop_assert!(result.equity_curve.iter().all(|p| p.equity >= 0.0));
            prop_assert!((0.0..=1.0).contains(&result.max_drawdown));
            prop_assert!((0.0..=1.0).contains(&result.win_rate));
        }
    }

    #[test]
    fn scores_do_not_depend_on_input_order(
        paths in prop::collection::vec(random_walk(40, 80), 2..6),
    ) {
        let universe: Vec<(String, Vec<OhlcvBar>)> = paths
            .iter()
            .enumerate()
            .map(|(i, closes)| (format!("I{i}"), bars_from_closes(closes)))
            .collect();
        let mut reversed = universe.clone();
        reversed.reverse();

        let factors = [
            WeightedFactor::new(FactorName::Momentum20, 0.6),
            WeightedFactor::new(FactorName::Rsi14, 0.4),
        ];
        let forward = compare(&universe, &factors).unwrap();
        let backward = compare(&reversed, &factors).unwrap();

        prop_assert_eq!(forward.entries.len(), universe.len());
        for entry in &forward.entries {
            let other = backward.get(&entry.instrument).unwrap();
            prop_assert_eq!(entry.composite_score.to_bits(), other.composite_score.to_bits());
        }
    }

    #[test]
    fn analyze_is_idempotent(closes in random_walk(30, 120)) {
        let bars = bars_from_closes(&closes);
        let first = analyze(&bars, 0.03);
        let second = analyze(&bars, 0.03);
        prop_assert_eq!(first, second);
    }
}
