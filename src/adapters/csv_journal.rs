//! CSV trade ledger: the streamed per-trade journal and the per-run results
//! table. Both share one row layout.

use crate::adapters::csv_adapter::TIMESTAMP_FORMAT;
use crate::domain::error::CrosstraderError;
use crate::domain::position::Trade;
use crate::ports::journal_port::TradeJournal;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const JOURNAL_FILE: &str = "trades_journal.csv";
pub const RESULTS_FILE: &str = "backtest_results.csv";

pub const TRADE_FIELDS: [&str; 9] = [
    "entry_time",
    "entry_price",
    "exit_time",
    "exit_price",
    "direction",
    "pnl",
    "pnl_percent",
    "entry_reason",
    "exit_reason",
];

/// One ledger row. Field order is the column order.
#[derive(Debug, Serialize)]
struct TradeRecord {
    entry_time: String,
    entry_price: f64,
    exit_time: String,
    exit_price: f64,
    direction: &'static str,
    pnl: f64,
    pnl_percent: f64,
    entry_reason: String,
    exit_reason: &'static str,
}

impl From<&Trade> for TradeRecord {
    fn from(t: &Trade) -> Self {
        TradeRecord {
            entry_time: t.entry_time.format(TIMESTAMP_FORMAT).to_string(),
            entry_price: t.entry_price,
            exit_time: t.exit_time.format(TIMESTAMP_FORMAT).to_string(),
            exit_price: t.exit_price,
            direction: t.direction.as_str(),
            pnl: t.pnl,
            pnl_percent: t.pnl_percent,
            entry_reason: t.entry_reason.to_string(),
            exit_reason: t.exit_reason.as_str(),
        }
    }
}

fn journal_error(path: &Path, reason: impl ToString) -> CrosstraderError {
    CrosstraderError::Journal {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

fn ensure_parent(path: &Path) -> Result<(), CrosstraderError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|e| journal_error(path, e))
        }
        _ => Ok(()),
    }
}

/// Append-only journal file. Rows from earlier runs are never touched; the
/// header goes in only when the file is new or empty.
pub struct CsvTradeJournal {
    path: PathBuf,
}

impl CsvTradeJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(JOURNAL_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TradeJournal for CsvTradeJournal {
    fn append(&mut self, trade: &Trade) -> Result<(), CrosstraderError> {
        ensure_parent(&self.path)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| journal_error(&self.path, e))?;
        let needs_header = file
            .metadata()
            .map_err(|e| journal_error(&self.path, e))?
            .len()
            == 0;

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            wtr.write_record(TRADE_FIELDS)
                .map_err(|e| journal_error(&self.path, e))?;
        }
        wtr.serialize(TradeRecord::from(trade))
            .map_err(|e| journal_error(&self.path, e))?;
        wtr.flush().map_err(|e| journal_error(&self.path, e))?;

        debug!(path = %self.path.display(), "journal row appended");
        Ok(())
    }
}

/// Rewrite the full results table for a run. The header is written even when
/// there are no trades.
pub fn write_results(path: &Path, trades: &[Trade]) -> Result<(), CrosstraderError> {
    ensure_parent(path)?;
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| journal_error(path, e))?;

    wtr.write_record(TRADE_FIELDS)
        .map_err(|e| journal_error(path, e))?;
    for trade in trades {
        wtr.serialize(TradeRecord::from(trade))
            .map_err(|e| journal_error(path, e))?;
    }
    wtr.flush().map_err(|e| journal_error(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::{EntryReason, ExitReason, Position};
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use tempfile::TempDir;

    fn at(minute: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap()
            + Duration::minutes(minute)
    }

    fn make_trade(entry_minute: i64, exit_price: f64, exit_reason: ExitReason) -> Trade {
        let reason = EntryReason {
            above_vwap: true,
            rsi_ok: true,
            volume_ok: false,
        };
        Position::open_long(at(entry_minute), 100.0, reason).close(
            at(entry_minute + 3),
            exit_price,
            exit_reason,
            0.0,
        )
    }

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn journal_writes_header_then_rows() {
        let dir = TempDir::new().unwrap();
        let mut journal = CsvTradeJournal::in_dir(dir.path());
        journal.append(&make_trade(0, 102.0, ExitReason::TakeProfit)).unwrap();
        journal.append(&make_trade(10, 99.0, ExitReason::StopLoss)).unwrap();

        let lines = read_lines(&dir.path().join(JOURNAL_FILE));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], TRADE_FIELDS.join(","));
        assert!(lines[1].starts_with("2024-01-15 09:15:00,100.0,2024-01-15 09:18:00,102.0,LONG,2.0,"));
        assert!(lines[1].ends_with(",EMA_CROSS_UP+VWAP_OK+RSI_OK,TP"));
        assert!(lines[2].ends_with(",SL"));
    }

    #[test]
    fn journal_appends_across_instances_without_second_header() {
        let dir = TempDir::new().unwrap();
        CsvTradeJournal::in_dir(dir.path())
            .append(&make_trade(0, 102.0, ExitReason::TakeProfit))
            .unwrap();
        CsvTradeJournal::in_dir(dir.path())
            .append(&make_trade(10, 101.0, ExitReason::EndOfData))
            .unwrap();

        let lines = read_lines(&dir.path().join(JOURNAL_FILE));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines.iter().filter(|l| l.starts_with("entry_time")).count(), 1);
        assert!(lines[2].ends_with(",EOD_CLOSE"));
    }

    #[test]
    fn journal_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("out").join("run1");
        let mut journal = CsvTradeJournal::in_dir(&nested);
        journal.append(&make_trade(0, 102.0, ExitReason::TakeProfit)).unwrap();
        assert!(journal.path().exists());
    }

    #[test]
    fn journal_into_directory_path_fails() {
        let dir = TempDir::new().unwrap();
        let mut journal = CsvTradeJournal::new(dir.path());
        let err = journal
            .append(&make_trade(0, 102.0, ExitReason::TakeProfit))
            .unwrap_err();
        assert!(matches!(err, CrosstraderError::Journal { .. }));
    }

    #[test]
    fn results_rewritten_each_time() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(RESULTS_FILE);
        write_results(
            &path,
            &[
                make_trade(0, 102.0, ExitReason::TakeProfit),
                make_trade(10, 99.0, ExitReason::StopLoss),
            ],
        )
        .unwrap();
        assert_eq!(read_lines(&path).len(), 3);

        write_results(&path, &[make_trade(20, 100.5, ExitReason::VwapBreak)]).unwrap();
        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with(",VWAP_BREAK"));
    }

    #[test]
    fn results_header_only_for_no_trades() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(RESULTS_FILE);
        write_results(&path, &[]).unwrap();
        assert_eq!(read_lines(&path), vec![TRADE_FIELDS.join(",")]);
    }
}
