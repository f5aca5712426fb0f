#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use crosstrader::domain::backtest::BacktestConfig;
use crosstrader::domain::error::{CrosstraderError, IngestError};
pub use crosstrader::domain::ohlcv::Bar;
use crosstrader::domain::normalize::{CanonicalTable, NormalizeReport};
use crosstrader::ports::data_port::DataPort;
use std::path::Path;
use std::process::ExitCode;

/// Closes that produce exactly one cross-up, entering at 105 and taking
/// profit at 120 with `tp = 0.02`, `sl = 0.01`.
pub const TAKE_PROFIT_CLOSES: [f64; 6] = [100.0, 100.0, 105.0, 106.0, 120.0, 90.0];

pub struct MockDataPort {
    pub bars: Vec<Bar>,
    pub error: Option<IngestError>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            bars: Vec::new(),
            error: None,
        }
    }

    pub fn with_bars(mut self, bars: Vec<Bar>) -> Self {
        self.bars = bars;
        self
    }

    pub fn with_error(mut self, error: IngestError) -> Self {
        self.error = Some(error);
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self) -> Result<CanonicalTable, CrosstraderError> {
        if let Some(ref source) = self.error {
            return Err(CrosstraderError::Ingestion {
                path: self.describe(),
                source: source.clone(),
            });
        }
        Ok(CanonicalTable {
            bars: self.bars.clone(),
            report: NormalizeReport {
                strategy: "mock",
                rows_read: self.bars.len(),
                rows_dropped: 0,
                duplicates_dropped: 0,
                columns: vec![
                    "datetime".into(),
                    "open".into(),
                    "high".into(),
                    "low".into(),
                    "close".into(),
                    "volume".into(),
                ],
            },
        })
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

pub fn minute(i: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(9, 15, 0)
        .unwrap()
        + Duration::minutes(i as i64)
}

/// Flat bar (open = high = low = close) so VWAP is the volume-weighted mean of
/// closes.
pub fn make_bar(i: usize, close: f64, volume: f64) -> Bar {
    Bar {
        timestamp: minute(i),
        open: close,
        high: close,
        low: close,
        close,
        volume,
    }
}

pub fn generate_bars(closes: &[f64], volume: f64) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(i, c, volume))
        .collect()
}

/// Plain CSV with a `Datetime` header, as a downloader would save it.
pub fn bars_to_csv(bars: &[Bar]) -> String {
    let mut out = String::from("Datetime,Open,High,Low,Close,Volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.timestamp.format("%Y-%m-%d %H:%M:%S"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    out
}

pub fn sample_config(output_dir: &Path) -> BacktestConfig {
    BacktestConfig {
        take_profit: 0.02,
        stop_loss: 0.01,
        output_dir: output_dir.to_path_buf(),
        ..BacktestConfig::default()
    }
}

pub fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

/// `ExitCode` has no `PartialEq`; compare through its debug form.
pub fn same_exit_code(actual: ExitCode, expected: ExitCode) -> bool {
    format!("{actual:?}") == format!("{expected:?}")
}
