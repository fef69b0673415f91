//! CSV price file adapter.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::domain::error::SignalbenchError;
use crate::domain::price::PriceBar;
use crate::ports::data_port::{DataPort, DateRange};

pub const DEFAULT_DELIMITER: u8 = b';';

const TIMESTAMP_COLUMNS: [&str; 3] = ["timestamp", "date", "datetime"];
const CLOSE_COLUMN: &str = "close";

/// Loads a `timestamp`/`close` series from a delimited text file.
pub struct CsvAdapter {
    path: PathBuf,
    delimiter: u8,
}

impl CsvAdapter {
    pub fn new(path: impl Into<PathBuf>, delimiter: u8) -> Self {
        Self {
            path: path.into(),
            delimiter,
        }
    }

    fn source_name(&self) -> String {
        self.path.display().to_string()
    }

    fn data_format(&self, reason: impl Into<String>) -> SignalbenchError {
        SignalbenchError::DataFormat {
            source_name: self.source_name(),
            reason: reason.into(),
        }
    }
}

impl DataPort for CsvAdapter {
    fn fetch_prices(&self, range: DateRange) -> Result<Vec<PriceBar>, SignalbenchError> {
        let content = fs::read_to_string(&self.path)?;

        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = rdr
            .headers()
            .map_err(|e| self.data_format(format!("unreadable header: {e}")))?
            .clone();
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
        };
        let ts_idx = find(&TIMESTAMP_COLUMNS)
            .ok_or_else(|| self.data_format("missing timestamp column"))?;
        let close_idx = find(&[CLOSE_COLUMN]).ok_or_else(|| self.data_format("missing close column"))?;

        let mut series: BTreeMap<NaiveDateTime, f64> = BTreeMap::new();
        let mut dropped = 0usize;
        let mut duplicates = 0usize;

        for record in rdr.records() {
            let Ok(record) = record else {
                dropped += 1;
                continue;
            };
            let parsed = record
                .get(ts_idx)
                .and_then(parse_timestamp)
                .zip(record.get(close_idx).and_then(parse_close));
            let Some((timestamp, close)) = parsed else {
                dropped += 1;
                continue;
            };
            if !range.contains(timestamp.date()) {
                continue;
            }
            if series.insert(timestamp, close).is_some() {
                duplicates += 1;
            }
        }

        if dropped > 0 {
            tracing::warn!(source = %self.source_name(), dropped, "dropped invalid rows");
        }
        if duplicates > 0 {
            tracing::debug!(source = %self.source_name(), duplicates, "duplicate timestamps, last row kept");
        }
        if series.is_empty() {
            return Err(SignalbenchError::NoData {
                source_name: self.source_name(),
            });
        }

        let bars: Vec<PriceBar> = series
            .into_iter()
            .map(|(timestamp, close)| PriceBar::new(timestamp, close))
            .collect();
        tracing::info!(source = %self.source_name(), bars = bars.len(), "loaded price series");
        Ok(bars)
    }
}

/// Parse a timestamp cell: unix seconds (10+ digits, 13+ read as
/// milliseconds), RFC 3339, `YYYY-MM-DD HH:MM:SS` or a bare date.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.len() >= 10 && s.bytes().all(|b| b.is_ascii_digit()) {
        let n: i64 = s.parse().ok()?;
        let dt = if s.len() >= 13 {
            DateTime::from_timestamp_millis(n)
        } else {
            DateTime::from_timestamp(n, 0)
        };
        return dt.map(|d| d.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn parse_close(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
