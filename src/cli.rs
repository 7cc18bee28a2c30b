//! CLI definition and dispatch.
//!
//! Results go to stdout; progress and diagnostics go through `tracing` to
//! stderr.

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::analysis::{analyze, Analysis};
use crate::domain::backtest::{run_backtest, BacktestResult};
use crate::domain::config_validation::{
    build_backtest_config, build_data_config, build_scoring_config, build_strategy_config,
    read_risk_free_rate,
};
use crate::domain::error::EquitylabError;
use crate::domain::metrics::RiskMetrics;
use crate::domain::ohlcv::{ensure_ordered, OhlcvBar};
use crate::domain::scoring::{compare, ScoreBoard};
use crate::domain::strategy::build_policy;
use crate::domain::universe::{load_universe, parse_instruments, LoadedUniverse};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(
    name = "equitylab",
    about = "Technical factors, risk metrics, backtests and factor ranking for daily equity bars"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute the latest factors and risk metrics for one instrument
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        instrument: String,
    },
    /// Backtest a trading policy on one instrument
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        instrument: String,
        /// Overrides [strategy] policy
        #[arg(long)]
        policy: Option<String>,
    },
    /// Rank instruments by weighted factor score
    Compare {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated list; defaults to every instrument in csv_dir
        #[arg(short, long)]
        instruments: Option<String>,
    },
    /// Check a configuration file without running anything
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Analyze { config, instrument } => run_analyze(&config, &instrument),
        Command::Backtest {
            config,
            instrument,
            policy,
        } => run_backtest_command(&config, &instrument, policy.as_deref()),
        Command::Compare {
            config,
            instruments,
        } => run_compare(&config, instruments.as_deref()),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, EquitylabError> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

fn single_instrument(raw: &str) -> Result<String, EquitylabError> {
    let mut parsed = parse_instruments(raw)?;
    if parsed.len() != 1 {
        return Err(EquitylabError::invalid_configuration(format!(
            "expected one instrument, got {}",
            parsed.len()
        )));
    }
    Ok(parsed.remove(0))
}

fn fetch_one(config: &dyn ConfigPort, instrument: &str) -> Result<Vec<OhlcvBar>, EquitylabError> {
    let data = build_data_config(config)?;
    let port = CsvAdapter::new(data.csv_dir);
    let bars = port.fetch_series(instrument, data.start_date, data.end_date)?;
    ensure_ordered(&bars)?;
    info!(instrument, bars = bars.len(), "series loaded");
    Ok(bars)
}

fn run_analyze(config_path: &Path, instrument: &str) -> Result<(), EquitylabError> {
    let config = load_config(config_path)?;
    let instrument = single_instrument(instrument)?;
    let risk_free_rate = read_risk_free_rate(&config)?;

    let bars = fetch_one(&config, &instrument)?;
    let analysis = analyze(&bars, risk_free_rate);
    if analysis.factors.is_empty() {
        info!(bars = bars.len(), "series too short for factors");
    }

    write_analysis(&mut io::stdout().lock(), &instrument, &analysis)?;
    Ok(())
}

fn run_backtest_command(
    config_path: &Path,
    instrument: &str,
    policy_override: Option<&str>,
) -> Result<(), EquitylabError> {
    let config = load_config(config_path)?;
    let instrument = single_instrument(instrument)?;
    let bt_config = build_backtest_config(&config)?;
    let risk_free_rate = read_risk_free_rate(&config)?;
    let strategy = build_strategy_config(&config, policy_override)?;
    let policy = build_policy(&strategy)?;

    let bars = fetch_one(&config, &instrument)?;
    info!(
        policy = policy.name(),
        bars = bars.len(),
        "running backtest"
    );
    let result = run_backtest(&bars, policy.as_ref(), &bt_config)?;
    info!(trades = result.trades.len(), "backtest finished");

    write_backtest(
        &mut io::stdout().lock(),
        &instrument,
        &result,
        &result.equity_risk(risk_free_rate),
    )?;
    Ok(())
}

fn run_compare(config_path: &Path, instruments: Option<&str>) -> Result<(), EquitylabError> {
    let config = load_config(config_path)?;
    let weighted = build_scoring_config(&config)?;
    let data = build_data_config(&config)?;
    let port = CsvAdapter::new(data.csv_dir);

    let ids = match instruments {
        Some(list) => parse_instruments(list)?,
        None => port.list_instruments()?,
    };
    info!(count = ids.len(), "loading universe");

    let loaded = load_universe(&port, &ids, data.start_date, data.end_date)?;
    let board = compare(&loaded.series, &weighted)?;
    info!(
        ranked = board.entries.len(),
        excluded = board.excluded.len(),
        "comparison finished"
    );

    write_scoreboard(&mut io::stdout().lock(), &board, &loaded)?;
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), EquitylabError> {
    let config = load_config(config_path)?;
    let mut out = io::stdout().lock();

    let data = build_data_config(&config)?;
    writeln!(out, "[data]      csv_dir = {}", data.csv_dir.display())?;

    let bt = build_backtest_config(&config)?;
    read_risk_free_rate(&config)?;
    writeln!(
        out,
        "[backtest]  capital {:.2}, fee {}, slippage {}, size {}",
        bt.initial_capital, bt.fee_rate, bt.slippage, bt.position_size
    )?;

    if config.get_string("strategy", "policy").is_some() {
        let strategy = build_strategy_config(&config, None)?;
        let policy = build_policy(&strategy)?;
        writeln!(out, "[strategy]  {}", policy.description())?;
    }

    if config.get_string("scoring", "factors").is_some() {
        let weighted = build_scoring_config(&config)?;
        let names: Vec<String> = weighted.iter().map(|w| w.factor.to_string()).collect();
        writeln!(out, "[scoring]   {}", names.join(", "))?;
    }

    writeln!(out, "configuration is valid")?;
    Ok(())
}

pub fn write_risk(out: &mut impl Write, risk: &RiskMetrics) -> io::Result<()> {
    writeln!(out, "Total Return:     {:.2}%", risk.total_return * 100.0)?;
    writeln!(out, "Annualized:       {:.2}%", risk.annualized_return * 100.0)?;
    writeln!(out, "Volatility:       {:.2}%", risk.annualized_volatility * 100.0)?;
    writeln!(out, "VaR 95 / 99:      {:.2}% / {:.2}%", risk.var_95 * 100.0, risk.var_99 * 100.0)?;
    writeln!(out, "CVaR 95:          {:.2}%", risk.cvar_95 * 100.0)?;
    writeln!(
        out,
        "Max Drawdown:     -{:.1}% ({} bars)",
        risk.max_drawdown * 100.0,
        risk.max_drawdown_duration
    )?;
    writeln!(out, "Sharpe Ratio:     {:.2}", risk.sharpe_ratio)?;
    writeln!(out, "Sortino Ratio:    {:.2}", risk.sortino_ratio)?;
    writeln!(out, "Calmar Ratio:     {:.2}", risk.calmar_ratio)?;
    writeln!(out, "Skew / Kurtosis:  {:.2} / {:.2}", risk.skewness, risk.kurtosis)?;
    writeln!(
        out,
        "Up / Down vs mean: {:.1}% / {:.1}%",
        risk.upside_vs_mean, risk.downside_vs_mean
    )
}

pub fn write_analysis(
    out: &mut impl Write,
    instrument: &str,
    analysis: &Analysis,
) -> io::Result<()> {
    writeln!(out, "=== {instrument} ===")?;
    match analysis.latest() {
        Some(latest) => {
            writeln!(out, "As of {} (close {:.2})", latest.date, latest.close)?;
            writeln!(
                out,
                "SMA 5/20/60:      {:.2} / {:.2} / {:.2}",
                latest.sma_5, latest.sma_20, latest.sma_60
            )?;
            writeln!(out, "Momentum 20:      {:.2}%", latest.momentum_20)?;
            writeln!(out, "RSI 14:           {:.1}", latest.rsi_14)?;
            writeln!(
                out,
                "MACD:             {:.3} (signal {:.3})",
                latest.macd, latest.macd_signal
            )?;
            writeln!(out, "Bollinger pos:    {:.1}", latest.boll_position)?;
            writeln!(
                out,
                "KDJ:              {:.1} / {:.1} / {:.1}",
                latest.kdj_k, latest.kdj_d, latest.kdj_j
            )?;
            writeln!(out, "Williams %R:      {:.1}", latest.williams_r_14)?;
            writeln!(out, "ATR 14:           {:.3}", latest.atr_14)?;
            writeln!(out, "Volume ratio:     {:.2}", latest.volume_ratio)?;
        }
        None => writeln!(out, "Not enough bars for factors")?,
    }
    writeln!(out)?;
    write_risk(out, &analysis.risk)
}

pub fn write_backtest(
    out: &mut impl Write,
    instrument: &str,
    result: &BacktestResult,
    equity_risk: &RiskMetrics,
) -> io::Result<()> {
    writeln!(out, "=== {instrument}: {} ===", result.strategy_description)?;
    writeln!(out, "Final Return:     {:.2}%", result.final_return * 100.0)?;
    writeln!(out, "Realized P&L:     {:.2}", result.realized_pnl)?;
    writeln!(out, "Total Fees:       {:.2}", result.total_fees)?;
    writeln!(out, "Max Drawdown:     -{:.1}%", result.max_drawdown * 100.0)?;
    writeln!(out, "Round Trips:      {}", result.round_trips.len())?;
    writeln!(
        out,
        "Win Rate:         {:.1}% ({}W / {}L / {} even)",
        result.win_rate * 100.0,
        result.wins,
        result.losses,
        result.breakevens
    )?;
    if !result.round_trips.is_empty() {
        let days: i64 = result.round_trips.iter().map(|rt| rt.holding_days()).sum();
        writeln!(
            out,
            "Avg Holding:      {:.1} days",
            days as f64 / result.round_trips.len() as f64
        )?;
    }
    writeln!(out, "Sharpe (equity):  {:.2}", equity_risk.sharpe_ratio)?;

    if !result.trades.is_empty() {
        writeln!(out, "\nTrades:")?;
        for trade in &result.trades {
            writeln!(
                out,
                "  {}  {:<4} {:>8} @ {:>10.2}  fee {:>8.2}  {}",
                trade.date,
                format!("{:?}", trade.kind).to_uppercase(),
                trade.quantity,
                trade.price,
                trade.fee,
                trade.reason
            )?;
        }
    }
    Ok(())
}

pub fn write_scoreboard(
    out: &mut impl Write,
    board: &ScoreBoard,
    loaded: &LoadedUniverse,
) -> io::Result<()> {
    let names: Vec<String> = board
        .weights
        .iter()
        .map(|w| format!("{} {:.0}%", w.factor, w.weight * 100.0))
        .collect();
    writeln!(out, "Factors: {}", names.join(", "))?;
    writeln!(out, "{:>4}  {:<12} {:>8}", "Rank", "Instrument", "Score")?;
    for entry in &board.entries {
        writeln!(
            out,
            "{:>4}  {:<12} {:>8.2}",
            entry.rank, entry.instrument, entry.composite_score
        )?;
    }
    for skipped in &loaded.skipped {
        writeln!(out, "skipped {}: {}", skipped.instrument, skipped.reason)?;
    }
    for excluded in &board.excluded {
        writeln!(out, "excluded {}: {}", excluded.instrument, excluded.reason)?;
    }
    Ok(())
}
