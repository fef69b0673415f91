//! Price data access port trait.

use crate::domain::error::SignalbenchError;
use crate::domain::price::PriceBar;
use chrono::NaiveDate;

/// Inclusive calendar window applied by the loader; `None` leaves a side open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }
}

/// Producer of a clean price series: ascending, de-duplicated, no invalid rows.
pub trait DataPort {
    fn fetch_prices(&self, range: DateRange) -> Result<Vec<PriceBar>, SignalbenchError>;
}
