//! Canonicalization of raw tabular price data.
//!
//! A [`RawTable`] is whatever a parse strategy pulled out of the input file:
//! header names plus rows of untyped cells. [`normalize`] turns it into the
//! canonical, strictly increasing sequence of [`Bar`]s or explains why it
//! cannot.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::domain::error::IngestError;
use crate::domain::ohlcv::Bar;

/// Header names (case-insensitive) that identify the timestamp column outright.
pub const TIMESTAMP_COLUMN_NAMES: [&str; 4] = ["datetime", "date", "timestamp", "time"];

const COLUMN_ALIASES: [(&str, &str); 4] = [
    ("adj close", "close"),
    ("last", "close"),
    ("price", "close"),
    ("vol", "volume"),
];

const REQUIRED_COLUMNS: [&str; 4] = ["open", "high", "low", "close"];

const OFFSET_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_DATETIME_FORMATS: [&str; 10] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];

/// Untyped table as produced by a parse strategy.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    fn cell(&self, row: usize, column: usize) -> &str {
        self.rows[row].get(column).map(|s| s.trim()).unwrap_or("")
    }
}

/// What normalization did to the input.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeReport {
    /// Name of the parse strategy that produced the table.
    pub strategy: &'static str,
    pub rows_read: usize,
    /// Rows dropped for a missing timestamp or OHLC value.
    pub rows_dropped: usize,
    /// Rows dropped because an earlier row had the same timestamp.
    pub duplicates_dropped: usize,
    /// Canonical column names, after renaming.
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalTable {
    pub bars: Vec<Bar>,
    pub report: NormalizeReport,
}

/// Parse a single cell as a timestamp. Offset-aware values keep their
/// wall-clock time; bare dates become midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    for fmt in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some(dt.naive_local());
        }
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse a numeric cell; anything unparsable or non-finite is missing.
pub fn parse_number(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Locate the timestamp column: an exact name match first, otherwise the first
/// column where at least 10% of the non-empty cells parse, rounded up, and
/// never fewer than one.
pub fn detect_timestamp_column(table: &RawTable) -> Option<usize> {
    let by_name = table.headers.iter().position(|h| {
        let h = h.trim().to_lowercase();
        TIMESTAMP_COLUMN_NAMES.contains(&h.as_str())
    });
    if by_name.is_some() {
        return by_name;
    }

    (0..table.headers.len()).find(|&col| {
        let mut non_empty = 0usize;
        let mut parsed = 0usize;
        for row in 0..table.rows.len() {
            let cell = table.cell(row, col);
            if cell.is_empty() {
                continue;
            }
            non_empty += 1;
            if parse_timestamp(cell).is_some() {
                parsed += 1;
            }
        }
        parsed >= non_empty.div_ceil(10).max(1)
    })
}

fn canonical_columns(table: &RawTable, timestamp_col: usize) -> Vec<String> {
    let mut columns: Vec<String> = table
        .headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == timestamp_col {
                "datetime".to_string()
            } else {
                h.trim().to_lowercase()
            }
        })
        .collect();

    // An alias only applies when its target is not already present, so an
    // explicit `close` always wins over `adj close`.
    for (alias, target) in COLUMN_ALIASES {
        if columns.iter().any(|c| c == target) {
            continue;
        }
        if let Some(pos) = columns
            .iter()
            .enumerate()
            .position(|(i, c)| i != timestamp_col && c == alias)
        {
            columns[pos] = target.to_string();
        }
    }
    columns
}

/// Turn a raw table into canonical bars.
pub fn normalize(table: &RawTable) -> Result<CanonicalTable, IngestError> {
    let detected: Vec<String> = table.headers.iter().map(|h| h.trim().to_string()).collect();

    let timestamp_col =
        detect_timestamp_column(table).ok_or_else(|| IngestError::NoTimestampColumn {
            columns: detected.clone(),
        })?;

    let columns = canonical_columns(table, timestamp_col);
    let find = |name: &str| columns.iter().position(|c| c == name);

    let mut required = [0usize; 4];
    let mut missing = Vec::new();
    for (slot, name) in required.iter_mut().zip(REQUIRED_COLUMNS) {
        match find(name) {
            Some(idx) => *slot = idx,
            None => missing.push(name.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(IngestError::MissingColumns {
            missing,
            columns: columns.clone(),
        });
    }
    let [open_col, high_col, low_col, close_col] = required;
    let volume_col = find("volume");

    let mut bars = Vec::with_capacity(table.rows.len());
    let mut rows_dropped = 0usize;

    for row in 0..table.rows.len() {
        let parsed = (
            parse_timestamp(table.cell(row, timestamp_col)),
            parse_number(table.cell(row, open_col)),
            parse_number(table.cell(row, high_col)),
            parse_number(table.cell(row, low_col)),
            parse_number(table.cell(row, close_col)),
        );
        let (Some(timestamp), Some(open), Some(high), Some(low), Some(close)) = parsed else {
            rows_dropped += 1;
            continue;
        };
        let volume = volume_col
            .and_then(|col| parse_number(table.cell(row, col)))
            .filter(|v| *v >= 0.0)
            .unwrap_or(0.0);

        bars.push(Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    // Stable sort keeps file order among equal timestamps; dedup keeps the first.
    bars.sort_by_key(|b| b.timestamp);
    let before_dedup = bars.len();
    bars.dedup_by_key(|b| b.timestamp);
    let duplicates_dropped = before_dedup - bars.len();

    let mut columns = columns;
    if volume_col.is_none() {
        columns.push("volume".to_string());
    }

    if bars.is_empty() {
        return Err(IngestError::NoValidRows { columns });
    }

    Ok(CanonicalTable {
        bars,
        report: NormalizeReport {
            strategy: "",
            rows_read: table.rows.len(),
            rows_dropped,
            duplicates_dropped,
            columns,
        },
    })
}
