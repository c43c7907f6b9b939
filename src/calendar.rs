//! Expected-date calendars spanning a table's index.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AnalyzerError, Result};
use crate::table::TimeSeriesTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalendarMode {
    AllDays,
    /// Monday through Friday, no holiday calendar.
    BusinessDays,
}

impl CalendarMode {
    pub fn from_business(business: bool) -> Self {
        if business {
            Self::BusinessDays
        } else {
            Self::AllDays
        }
    }

    pub fn is_business(self) -> bool {
        matches!(self, Self::BusinessDays)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AllDays => "all_days",
            Self::BusinessDays => "business_days",
        }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        match self {
            Self::AllDays => true,
            Self::BusinessDays => !is_weekend(date),
        }
    }

    /// Next date after `date` that belongs to this calendar.
    pub fn next_after(self, date: NaiveDate) -> Option<NaiveDate> {
        let mut cursor = date.succ_opt()?;
        while !self.contains(cursor) {
            cursor = cursor.succ_opt()?;
        }
        Some(cursor)
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Dates in `[start, end]` that belong to `mode`, ascending.
pub fn date_range(start: NaiveDate, end: NaiveDate, mode: CalendarMode) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    let mut cursor = Some(start);
    while let Some(day) = cursor {
        if day > end {
            break;
        }
        if mode.contains(day) {
            out.push(day);
        }
        cursor = day.succ_opt();
    }
    out
}

pub fn calendar_range(table: &TimeSeriesTable, business: bool) -> Result<Vec<NaiveDate>> {
    calendar_for_mode(table, CalendarMode::from_business(business))
}

pub(crate) fn calendar_for_mode(
    table: &TimeSeriesTable,
    mode: CalendarMode,
) -> Result<Vec<NaiveDate>> {
    match (table.first_date(), table.last_date()) {
        (Some(start), Some(end)) => Ok(date_range(start, end, mode)),
        _ => {
            warn!(
                component = "calendar",
                event = "calendar.invalid_input",
                mode = mode.as_str(),
                reason = "empty_index"
            );
            Err(AnalyzerError::InvalidInput(
                "table index is empty; no calendar range can be derived".to_string(),
            ))
        }
    }
}

/// Positions within `calendar` whose date is absent from `index`. Both slices
/// must be ascending; index entries outside the calendar are skipped.
pub(crate) fn missing_positions(calendar: &[NaiveDate], index: &[NaiveDate]) -> Vec<usize> {
    let mut missing = Vec::new();
    let mut observed = index.iter().peekable();
    for (pos, day) in calendar.iter().enumerate() {
        while observed.next_if(|seen| *seen < day).is_some() {}
        if observed.next_if_eq(&day).is_none() {
            missing.push(pos);
        }
    }
    missing
}
