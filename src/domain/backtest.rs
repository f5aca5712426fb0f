//! Backtest engine: the FLAT/LONG position state machine.
//!
//! Frames are walked once, pairwise, from the second frame on. The first frame
//! only seeds the previous-value comparisons for crossover detection.
//!
//! Entry (FLAT only): fast EMA crosses strictly above the slow EMA.
//! Exit (LONG only, bars after the entry bar), first match wins:
//! 1. take profit, 2. stop loss, 3. close below VWAP, 4. fast EMA crosses below.
//! A position still open after the last frame is closed with `EOD_CLOSE`.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::domain::error::CrosstraderError;
use crate::domain::indicator::{IndicatorConfig, IndicatorFrame};
use crate::domain::metrics::RunSummary;
use crate::domain::position::{EntryReason, ExitReason, Position, Trade};
use crate::ports::journal_port::TradeJournal;

/// RSI below this counts as supportive at entry.
pub const RSI_OVERBOUGHT: f64 = 70.0;
/// Volume floor for the supportive volume flag, so zero-volume data never qualifies.
pub const MIN_SUPPORTIVE_VOLUME: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    /// Take-profit as a fraction of entry price.
    pub take_profit: f64,
    /// Stop-loss as a fraction of entry price.
    pub stop_loss: f64,
    /// Flat fee charged once per closed trade.
    pub commission_per_trade: f64,
    pub indicators: IndicatorConfig,
    pub output_dir: PathBuf,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            take_profit: 0.005,
            stop_loss: 0.0025,
            commission_per_trade: 0.0,
            indicators: IndicatorConfig::default(),
            output_dir: PathBuf::from("data"),
        }
    }
}

impl BacktestConfig {
    /// Non-positive take-profit or stop-loss fractions disable entries entirely.
    pub fn entries_enabled(&self) -> bool {
        self.take_profit > 0.0 && self.stop_loss > 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PositionState {
    Flat,
    Long(Position),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    pub summary: RunSummary,
    /// Every fast-over-slow crossover seen, whether or not it opened a position.
    pub cross_ups: usize,
    pub bars_processed: usize,
}

pub fn crossed_above(prev: &IndicatorFrame, cur: &IndicatorFrame) -> bool {
    prev.ema_fast <= prev.ema_slow && cur.ema_fast > cur.ema_slow
}

pub fn crossed_below(prev: &IndicatorFrame, cur: &IndicatorFrame) -> bool {
    prev.ema_fast >= prev.ema_slow && cur.ema_fast < cur.ema_slow
}

/// Supportive flags recorded on the entry bar.
pub fn entry_reason(frame: &IndicatorFrame) -> EntryReason {
    EntryReason {
        above_vwap: frame.close() > frame.vwap,
        rsi_ok: frame.rsi < RSI_OVERBOUGHT,
        volume_ok: frame.bar.volume >= MIN_SUPPORTIVE_VOLUME.max(0.5 * frame.vol_avg),
    }
}

pub fn exit_signal(
    position: &Position,
    prev: &IndicatorFrame,
    cur: &IndicatorFrame,
    config: &BacktestConfig,
) -> Option<ExitReason> {
    let close = cur.close();
    if position.should_take_profit(close, config.take_profit) {
        Some(ExitReason::TakeProfit)
    } else if position.should_stop_loss(close, config.stop_loss) {
        Some(ExitReason::StopLoss)
    } else if close < cur.vwap {
        Some(ExitReason::VwapBreak)
    } else if crossed_below(prev, cur) {
        Some(ExitReason::EmaCrossDown)
    } else {
        None
    }
}

fn record(
    journal: &mut dyn TradeJournal,
    trades: &mut Vec<Trade>,
    trade: Trade,
) -> Result<(), CrosstraderError> {
    debug!(
        exit_time = %trade.exit_time,
        exit_price = trade.exit_price,
        pnl = trade.pnl,
        reason = %trade.exit_reason,
        "closed position"
    );
    journal.append(&trade)?;
    trades.push(trade);
    Ok(())
}

/// Run the state machine over `frames`, appending each trade to `journal` as
/// soon as it closes.
pub fn run_backtest(
    frames: &[IndicatorFrame],
    config: &BacktestConfig,
    journal: &mut dyn TradeJournal,
) -> Result<BacktestResult, CrosstraderError> {
    let entries_enabled = config.entries_enabled();
    if !entries_enabled {
        warn!(
            take_profit = config.take_profit,
            stop_loss = config.stop_loss,
            "non-positive take-profit or stop-loss: no positions will be opened"
        );
    }

    let mut state = PositionState::Flat;
    let mut trades = Vec::new();
    let mut cross_ups = 0usize;

    for pair in frames.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        let cross_up = crossed_above(prev, cur);
        if cross_up {
            cross_ups += 1;
        }

        state = match state {
            PositionState::Flat if cross_up && entries_enabled => {
                let reason = entry_reason(cur);
                debug!(
                    entry_time = %cur.bar.timestamp,
                    entry_price = cur.close(),
                    reason = %reason,
                    "opened position"
                );
                PositionState::Long(Position::open_long(cur.bar.timestamp, cur.close(), reason))
            }
            PositionState::Flat => PositionState::Flat,
            PositionState::Long(position) => match exit_signal(&position, prev, cur, config) {
                Some(reason) => {
                    let trade = position.close(
                        cur.bar.timestamp,
                        cur.close(),
                        reason,
                        config.commission_per_trade,
                    );
                    record(journal, &mut trades, trade)?;
                    PositionState::Flat
                }
                None => PositionState::Long(position),
            },
        };
    }

    if let (PositionState::Long(position), Some(last)) = (state, frames.last()) {
        let trade = position.close(
            last.bar.timestamp,
            last.close(),
            ExitReason::EndOfData,
            config.commission_per_trade,
        );
        record(journal, &mut trades, trade)?;
    }

    let summary = RunSummary::compute(&trades);
    Ok(BacktestResult {
        trades,
        summary,
        cross_ups,
        bars_processed: frames.len(),
    })
}
