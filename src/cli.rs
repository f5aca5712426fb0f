//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::{CsvAdapter, write_canonical};
use crate::adapters::csv_journal::{CsvTradeJournal, RESULTS_FILE, write_results};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::validate_backtest_config;
use crate::domain::error::CrosstraderError;
use crate::domain::indicator::{IndicatorConfig, compute_indicators};
use crate::domain::metrics::RunSummary;
use crate::domain::position::Trade;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

/// Number of trades echoed to the console after a run.
pub const SAMPLE_TRADES: usize = 10;

#[derive(Parser, Debug)]
#[command(name = "crosstrader", about = "EMA crossover backtester for minute bars")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest over a price file
    Backtest {
        input: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        overrides: BacktestOverrides,
    },
    /// Normalize a price file into canonical CSV
    Clean {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a backtest configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(clap::Args, Debug, Default, Clone, PartialEq)]
pub struct BacktestOverrides {
    #[arg(long)]
    pub take_profit: Option<f64>,
    #[arg(long)]
    pub stop_loss: Option<f64>,
    #[arg(long)]
    pub vol_window: Option<usize>,
    #[arg(long)]
    pub commission: Option<f64>,
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,
}

impl BacktestOverrides {
    pub fn apply(&self, config: &mut BacktestConfig) -> Result<(), CrosstraderError> {
        let invalid = |key: &str, reason: &str| CrosstraderError::ConfigInvalid {
            section: "command line".into(),
            key: key.into(),
            reason: reason.into(),
        };

        if let Some(tp) = self.take_profit {
            if !tp.is_finite() {
                return Err(invalid("take-profit", "must be finite"));
            }
            config.take_profit = tp;
        }
        if let Some(sl) = self.stop_loss {
            if !sl.is_finite() {
                return Err(invalid("stop-loss", "must be finite"));
            }
            config.stop_loss = sl;
        }
        if let Some(window) = self.vol_window {
            if window == 0 {
                return Err(invalid("vol-window", "must be at least 1"));
            }
            config.indicators.vol_window = window;
        }
        if let Some(fee) = self.commission {
            if !fee.is_finite() || fee < 0.0 {
                return Err(invalid("commission", "must be non-negative"));
            }
            config.commission_per_trade = fee;
        }
        if let Some(ref dir) = self.output_dir {
            config.output_dir = dir.clone();
        }
        Ok(())
    }
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            input,
            config,
            overrides,
        } => run_backtest(&input, config.as_deref(), &overrides),
        Command::Clean { input, output } => run_clean(&input, output.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(err: CrosstraderError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, CrosstraderError> {
    match path {
        Some(p) => {
            eprintln!("Loading config from {}", p.display());
            FileConfigAdapter::from_file(p)
        }
        None => Ok(FileConfigAdapter::default()),
    }
}

fn run_backtest(
    input: &Path,
    config_path: Option<&Path>,
    overrides: &BacktestOverrides,
) -> ExitCode {
    // Stage 1: Load and validate config
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };
    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(e);
    }

    // Stage 2: Build BacktestConfig, command line wins
    let mut bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    if let Err(e) = overrides.apply(&mut bt_config) {
        return fail(e);
    }

    // Stages 3-6: Ingest, run, write, report
    let data_port = CsvAdapter::new(input);
    run_backtest_pipeline(&data_port, &bt_config)
}

fn positive_usize(
    adapter: &dyn ConfigPort,
    key: &str,
    default: usize,
) -> Result<usize, CrosstraderError> {
    let value = adapter.get_int("indicators", key, default as i64);
    usize::try_from(value)
        .ok()
        .filter(|v| *v >= 1)
        .ok_or_else(|| CrosstraderError::ConfigInvalid {
            section: "indicators".into(),
            key: key.into(),
            reason: "must be at least 1".into(),
        })
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, CrosstraderError> {
    let defaults = BacktestConfig::default();
    let indicator_defaults = IndicatorConfig::default();

    Ok(BacktestConfig {
        take_profit: adapter.get_double("backtest", "take_profit", defaults.take_profit),
        stop_loss: adapter.get_double("backtest", "stop_loss", defaults.stop_loss),
        commission_per_trade: adapter.get_double(
            "backtest",
            "commission_per_trade",
            defaults.commission_per_trade,
        ),
        indicators: IndicatorConfig {
            fast_span: positive_usize(adapter, "ema_fast", indicator_defaults.fast_span)?,
            slow_span: positive_usize(adapter, "ema_slow", indicator_defaults.slow_span)?,
            rsi_length: positive_usize(adapter, "rsi_length", indicator_defaults.rsi_length)?,
            vol_window: positive_usize(adapter, "vol_window", indicator_defaults.vol_window)?,
        },
        output_dir: adapter
            .get_string("output", "dir")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir),
    })
}

/// Ingest, compute indicators, run the state machine with the journal in
/// `config.output_dir`, then rewrite the results table.
pub fn execute_backtest(
    data_port: &dyn DataPort,
    config: &BacktestConfig,
) -> Result<BacktestResult, CrosstraderError> {
    let table = data_port.fetch_bars()?;
    if table.report.rows_dropped > 0 {
        info!(
            rows_dropped = table.report.rows_dropped,
            "dropped rows with a missing timestamp or price"
        );
    }

    let frames = compute_indicators(&table.bars, &config.indicators);
    info!(
        bars = frames.len(),
        indicators = %config.indicators,
        take_profit = config.take_profit,
        stop_loss = config.stop_loss,
        "running backtest"
    );

    let mut journal = CsvTradeJournal::in_dir(&config.output_dir);
    let result = backtest_engine::run_backtest(&frames, config, &mut journal)?;

    let results_path = config.output_dir.join(RESULTS_FILE);
    write_results(&results_path, &result.trades)?;
    info!(
        journal = %journal.path().display(),
        results = %results_path.display(),
        trades = result.trades.len(),
        "ledger written"
    );
    Ok(result)
}

pub fn run_backtest_pipeline(data_port: &dyn DataPort, config: &BacktestConfig) -> ExitCode {
    eprintln!("Loading data from {}", data_port.describe());
    let result = match execute_backtest(data_port, config) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    print_summary(&result.summary);
    print_sample_trades(&result.trades);
    eprintln!(
        "\nResults written to: {}",
        config.output_dir.join(RESULTS_FILE).display()
    );
    ExitCode::SUCCESS
}

pub fn print_summary(summary: &RunSummary) {
    eprintln!("\n=== Backtest Summary ===");
    eprintln!("Total Trades:     {}", summary.total_trades);
    eprintln!("Total PnL:        {:.2}", summary.total_pnl);
    eprintln!("Average PnL:      {:.4}", summary.avg_pnl);
    eprintln!("Win Rate:         {:.1}%", summary.win_rate * 100.0);
    eprintln!(
        "Won / Lost:       {} / {}",
        summary.trades_won, summary.trades_lost
    );
    eprintln!("Largest Win:      {:.2}", summary.largest_win);
    eprintln!("Largest Loss:     {:.2}", summary.largest_loss);
    eprintln!("Max Drawdown:     {:.2}", summary.max_drawdown);
}

pub fn print_sample_trades(trades: &[Trade]) {
    if trades.is_empty() {
        eprintln!("\nNo trades.");
        return;
    }
    eprintln!("\n=== First {} Trades ===", trades.len().min(SAMPLE_TRADES));
    for t in trades.iter().take(SAMPLE_TRADES) {
        let pnl_sign = if t.pnl >= 0.0 { "+" } else { "" };
        eprintln!(
            "  {} @ {:.2} -> {} @ {:.2}  {}{:.2} ({:+.2}%)  {} / {}",
            t.entry_time,
            t.entry_price,
            t.exit_time,
            t.exit_price,
            pnl_sign,
            t.pnl,
            t.pnl_percent * 100.0,
            t.entry_reason,
            t.exit_reason,
        );
    }
}

fn run_clean(input: &Path, output: Option<&Path>) -> ExitCode {
    let data_port = CsvAdapter::new(input);
    let table = match data_port.fetch_bars() {
        Ok(t) => t,
        Err(e) => return fail(e),
    };

    let written = match output {
        Some(path) => File::create(path).and_then(|f| write_canonical(&table.bars, f)),
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            write_canonical(&table.bars, &mut lock).and_then(|()| lock.flush())
        }
    };
    if let Err(e) = written {
        return fail(CrosstraderError::Io(e));
    }

    let report = &table.report;
    eprintln!(
        "Loaded {} rows ({} parse), kept {}, dropped {} invalid and {} duplicate",
        report.rows_read,
        report.strategy,
        table.bars.len(),
        report.rows_dropped,
        report.duplicates_dropped,
    );
    if let Some(path) = output {
        eprintln!("Clean data written to: {}", path.display());
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(Some(config_path)) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };
    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(e);
    }
    let config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    eprintln!("\nIndicators:    {}", config.indicators);
    eprintln!("Take Profit:   {:.4}", config.take_profit);
    eprintln!("Stop Loss:     {:.4}", config.stop_loss);
    eprintln!("Commission:    {:.2}", config.commission_per_trade);
    eprintln!("Output Dir:    {}", config.output_dir.display());
    if !config.entries_enabled() {
        eprintln!("warning: non-positive take profit or stop loss, no trades will open");
    }
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
