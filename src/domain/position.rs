//! Open position and closed trade records.

use chrono::NaiveDateTime;
use std::fmt;

/// Base entry tag: the fast EMA crossed above the slow EMA.
pub const ENTRY_TAG: &str = "EMA_CROSS_UP";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Long,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "LONG",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supportive conditions observed on the entry bar. Diagnostic only: none of
/// them gates the entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryReason {
    pub above_vwap: bool,
    pub rsi_ok: bool,
    pub volume_ok: bool,
}

impl fmt::Display for EntryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(ENTRY_TAG)?;
        if self.above_vwap {
            f.write_str("+VWAP_OK")?;
        }
        if self.rsi_ok {
            f.write_str("+RSI_OK")?;
        }
        if self.volume_ok {
            f.write_str("+VOL_OK")?;
        }
        Ok(())
    }
}

/// Exit rules in priority order, plus the end-of-data close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    VwapBreak,
    EmaCrossDown,
    EndOfData,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::TakeProfit => "TP",
            ExitReason::StopLoss => "SL",
            ExitReason::VwapBreak => "VWAP_BREAK",
            ExitReason::EmaCrossDown => "EMA_CROSS_DOWN",
            ExitReason::EndOfData => "EOD_CLOSE",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single live position. Exit fields do not exist until [`Position::close`]
/// consumes it into a [`Trade`].
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    pub direction: Direction,
    pub entry_reason: EntryReason,
}

impl Position {
    pub fn open_long(entry_time: NaiveDateTime, entry_price: f64, entry_reason: EntryReason) -> Self {
        Position {
            entry_time,
            entry_price,
            direction: Direction::Long,
            entry_reason,
        }
    }

    pub fn take_profit_price(&self, take_profit: f64) -> f64 {
        self.entry_price * (1.0 + take_profit)
    }

    pub fn stop_loss_price(&self, stop_loss: f64) -> f64 {
        self.entry_price * (1.0 - stop_loss)
    }

    pub fn should_take_profit(&self, price: f64, take_profit: f64) -> bool {
        price >= self.take_profit_price(take_profit)
    }

    pub fn should_stop_loss(&self, price: f64, stop_loss: f64) -> bool {
        price <= self.stop_loss_price(stop_loss)
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        match self.direction {
            Direction::Long => price - self.entry_price,
        }
    }

    /// Close at `exit_price`, charging the flat `commission` once.
    pub fn close(
        self,
        exit_time: NaiveDateTime,
        exit_price: f64,
        exit_reason: ExitReason,
        commission: f64,
    ) -> Trade {
        let pnl = self.unrealized_pnl(exit_price) - commission;
        let pnl_percent = if self.entry_price != 0.0 {
            pnl / self.entry_price
        } else {
            0.0
        };
        Trade {
            entry_time: self.entry_time,
            entry_price: self.entry_price,
            exit_time,
            exit_price,
            direction: self.direction,
            pnl,
            pnl_percent,
            entry_reason: self.entry_reason,
            exit_reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,
    pub direction: Direction,
    pub pnl: f64,
    pub pnl_percent: f64,
    pub entry_reason: EntryReason,
    pub exit_reason: ExitReason,
}
