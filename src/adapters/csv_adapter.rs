//! CSV file data adapter.
//!
//! Reads one price file and tries each parse strategy in turn until one yields
//! a table that normalizes. Also writes canonical bars back out as CSV.

use crate::domain::error::{CrosstraderError, IngestError};
use crate::domain::normalize::{
    CanonicalTable, RawTable, TIMESTAMP_COLUMN_NAMES, normalize, parse_timestamp,
};
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, info};

/// Timestamp layout for every CSV this crate writes.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub const CANONICAL_COLUMNS: [&str; 6] = ["datetime", "open", "high", "low", "close", "volume"];

type ParseStrategy = fn(&str) -> Result<RawTable, IngestError>;

/// Tried in order; the first table that normalizes wins.
const PARSE_STRATEGIES: [(&str, ParseStrategy); 3] = [
    ("plain", parse_plain),
    ("indexed", parse_indexed),
    ("multi-header", parse_multi_header),
];

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self) -> Result<CanonicalTable, CrosstraderError> {
        let ingestion_error = |source: IngestError| CrosstraderError::Ingestion {
            path: self.path.display().to_string(),
            source,
        };

        let bytes = fs::read(&self.path).map_err(|e| {
            ingestion_error(IngestError::Unreadable {
                reason: e.to_string(),
            })
        })?;
        let content = String::from_utf8_lossy(&bytes);
        let table = ingest_str(&content).map_err(ingestion_error)?;

        info!(
            path = %self.path.display(),
            strategy = table.report.strategy,
            bars = table.bars.len(),
            rows_dropped = table.report.rows_dropped,
            duplicates_dropped = table.report.duplicates_dropped,
            "loaded price data"
        );
        Ok(table)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Run the parse strategies over raw CSV text.
///
/// On total failure the error reported is the first one that got past parsing
/// (it names the columns that were seen), or the last parse error when no
/// strategy could even read the text.
pub fn ingest_str(content: &str) -> Result<CanonicalTable, IngestError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut failure: Option<IngestError> = None;

    for (name, parse) in PARSE_STRATEGIES {
        match parse(content).and_then(|table| normalize(&table)) {
            Ok(mut canonical) => {
                canonical.report.strategy = name;
                return Ok(canonical);
            }
            Err(err) => {
                debug!(strategy = name, error = %err, "parse strategy failed");
                let keep_previous = matches!(
                    failure,
                    Some(ref prev) if !matches!(prev, IngestError::Unreadable { .. })
                );
                if !keep_previous {
                    failure = Some(err);
                }
            }
        }
    }

    Err(failure.unwrap_or_else(|| IngestError::Unreadable {
        reason: "no parse strategy applied".to_string(),
    }))
}

fn read_records(content: &str) -> Result<Vec<Vec<String>>, IngestError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| IngestError::Unreadable {
            reason: format!("CSV parse error: {}", e),
        })?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        records.push(record.iter().map(str::to_string).collect());
    }
    Ok(records)
}

fn split_header(
    mut records: Vec<Vec<String>>,
    header_rows: usize,
) -> Result<(Vec<Vec<String>>, Vec<Vec<String>>), IngestError> {
    if records.len() < header_rows {
        return Err(IngestError::Unreadable {
            reason: format!("expected {} header row(s), found {}", header_rows, records.len()),
        });
    }
    let rows = records.split_off(header_rows);
    Ok((records, rows))
}

/// A single header row naming every column.
fn parse_plain(content: &str) -> Result<RawTable, IngestError> {
    let (mut header, rows) = split_header(read_records(content)?, 1)?;
    Ok(RawTable::new(header.remove(0), rows))
}

/// The first column is an unnamed datetime index: either its header cell is
/// blank or missing entirely, so data rows are one cell wider than the header.
fn parse_indexed(content: &str) -> Result<RawTable, IngestError> {
    let (mut header, rows) = split_header(read_records(content)?, 1)?;
    let mut headers = header.remove(0);

    if !rows.is_empty() && rows.iter().all(|r| r.len() == headers.len() + 1) {
        headers.insert(0, String::new());
    }
    if rows.is_empty() || headers.is_empty() {
        return Err(IngestError::Unreadable {
            reason: "no rows to index".to_string(),
        });
    }
    if !rows
        .iter()
        .all(|r| r.first().is_some_and(|cell| parse_timestamp(cell).is_some()))
    {
        return Err(IngestError::Unreadable {
            reason: "first column is not a datetime index".to_string(),
        });
    }

    let index_name = headers[0].trim().to_lowercase();
    if !TIMESTAMP_COLUMN_NAMES.contains(&index_name.as_str()) {
        headers[0] = "datetime".to_string();
    }
    Ok(RawTable::new(headers, rows))
}

/// Two header rows. Each column takes its second-level label when present,
/// otherwise its first-level one.
fn parse_multi_header(content: &str) -> Result<RawTable, IngestError> {
    let (header, rows) = split_header(read_records(content)?, 2)?;
    let (top, sub) = (&header[0], &header[1]);
    let width = top.len().max(sub.len());

    let headers = (0..width)
        .map(|i| {
            let label = top.get(i).map(|s| s.as_str()).unwrap_or("");
            match sub.get(i).map(|s| s.as_str()) {
                Some(s) if !s.is_empty() => s.to_string(),
                _ => label.to_string(),
            }
        })
        .collect();
    Ok(RawTable::new(headers, rows))
}

/// Write bars as canonical CSV. Output depends only on the bars, so feeding it
/// back through ingestion and writing again reproduces it byte for byte.
pub fn write_canonical<W: Write>(bars: &[Bar], writer: W) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CANONICAL_COLUMNS)?;
    for bar in bars {
        wtr.write_record([
            bar.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ])?;
    }
    wtr.flush()
}
