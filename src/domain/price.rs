//! Price bar representation.

use chrono::NaiveDateTime;
use serde::Serialize;

/// One cleaned observation of the traded instrument.
///
/// A price series is a `&[PriceBar]` ordered ascending by timestamp with
/// unique timestamps; the loader is responsible for that ordering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub close: f64,
}

impl PriceBar {
    pub fn new(timestamp: NaiveDateTime, close: f64) -> Self {
        PriceBar { timestamp, close }
    }
}

/// Extract the close column of a series.
pub fn closes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Elapsed time between two instants in fractional days.
pub fn span_days(first: NaiveDateTime, last: NaiveDateTime) -> f64 {
    (last - first).num_seconds() as f64 / 86_400.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn closes_preserves_order() {
        let bars = vec![
            PriceBar::new(ts(1, 0), 10.0),
            PriceBar::new(ts(2, 0), 12.5),
            PriceBar::new(ts(3, 0), 11.0),
        ];
        assert_eq!(closes(&bars), vec![10.0, 12.5, 11.0]);
    }

    #[test]
    fn span_days_is_fractional() {
        assert!((span_days(ts(1, 0), ts(3, 12)) - 2.5).abs() < f64::EPSILON);
        assert_eq!(span_days(ts(5, 0), ts(5, 0)), 0.0);
    }
}
