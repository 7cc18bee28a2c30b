//! equitylab: technical factors, risk metrics, single-instrument backtests
//! and multi-factor ranking over daily OHLCV bars.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;

pub use domain::analysis::{analyze, Analysis};
pub use domain::backtest::{run_backtest, BacktestConfig, BacktestResult};
pub use domain::error::EquitylabError;
pub use domain::scoring::{compare, ScoreBoard, WeightedFactor};
