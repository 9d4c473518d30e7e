//! CSV file data adapter.
//!
//! Reads `<base_path>/<ticker>.csv` with a header row naming the columns
//! `timestamp,open,high,low,close,volume` (any order, case-insensitive;
//! `date` or `datetime` are accepted for the timestamp column).

use crate::domain::error::EngineError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{ticker}.csv"))
    }
}

fn data_error(reason: impl Into<String>) -> EngineError {
    EngineError::Data {
        reason: reason.into(),
    }
}

/// `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD`, or epoch
/// milliseconds.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        let millis: i64 = raw.parse().ok()?;
        return DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

struct Columns {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, EngineError> {
        let find = |names: &[&str]| -> Result<usize, EngineError> {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
                .ok_or_else(|| data_error(format!("missing {} column", names[0])))
        };
        Ok(Self {
            timestamp: find(&["timestamp", "date", "datetime"])?,
            open: find(&["open"])?,
            high: find(&["high"])?,
            low: find(&["low"])?,
            close: find(&["close"])?,
            volume: find(&["volume"])?,
        })
    }
}

fn field<'r>(record: &'r csv::StringRecord, index: usize, name: &str, line: u64) -> Result<&'r str, EngineError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| data_error(format!("line {line}: missing {name} value")))
}

fn number(record: &csv::StringRecord, index: usize, name: &str, line: u64) -> Result<f64, EngineError> {
    let raw = field(record, index, name, line)?;
    raw.parse()
        .map_err(|e| data_error(format!("line {line}: invalid {name} value '{raw}': {e}")))
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, ticker: &str) -> Result<Vec<Bar>, EngineError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path)
            .map_err(|e| data_error(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| data_error(format!("CSV parse error: {e}")))?
            .clone();
        let columns = Columns::from_headers(&headers)?;
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| data_error(format!("CSV parse error: {e}")))?;
            let line = record.position().map_or(0, |p| p.line());

            let raw_ts = field(&record, columns.timestamp, "timestamp", line)?;
            let timestamp = parse_timestamp(raw_ts)
                .ok_or_else(|| data_error(format!("line {line}: invalid timestamp '{raw_ts}'")))?;

            bars.push(Bar {
                timestamp,
                open: number(&record, columns.open, "open", line)?,
                high: number(&record, columns.high, "high", line)?,
                low: number(&record, columns.low, "low", line)?,
                close: number(&record, columns.close, "close", line)?,
                volume: number(&record, columns.volume, "volume", line)?,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        debug!(ticker, bars = bars.len(), path = %path.display(), "loaded bars");
        Ok(bars)
    }
}
