//! Core domain types and logic. No I/O happens below this module.

pub mod analysis;
pub mod backtest;
pub mod config_validation;
pub mod error;
pub mod execution;
pub mod indicator;
pub mod indicator_helpers;
pub mod metrics;
pub mod ohlcv;
pub mod portfolio;
pub mod position;
pub mod scoring;
pub mod strategy;
pub mod universe;
