//! Missing-day reporting with per-weekday tallies.

use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::calendar::{calendar_for_mode, missing_positions, weekday_name, CalendarMode};
use crate::error::Result;
use crate::table::TimeSeriesTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayCount {
    pub weekday: Weekday,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingDayReport {
    pub mode: CalendarMode,
    pub expected_days: usize,
    pub observed_days: usize,
    pub missing_days: Vec<NaiveDate>,
    /// Weekdays with at least one missing date, most frequent first.
    pub weekday_counts: Vec<WeekdayCount>,
}

impl MissingDayReport {
    pub fn is_complete(&self) -> bool {
        self.missing_days.is_empty()
    }

    pub fn count_for(&self, weekday: Weekday) -> usize {
        self.weekday_counts
            .iter()
            .find(|c| c.weekday == weekday)
            .map(|c| c.count)
            .unwrap_or(0)
    }
}

impl fmt::Display for MissingDayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.missing_days.is_empty() {
            return writeln!(f, "No missing days.");
        }

        writeln!(f, "Missing days:")?;
        for day in &self.missing_days {
            writeln!(f, "  {day}")?;
        }
        writeln!(f)?;
        writeln!(f, "Value counts of weekdays for missing days:")?;
        for entry in &self.weekday_counts {
            writeln!(f, "  {:<10} {}", weekday_name(entry.weekday), entry.count)?;
        }
        Ok(())
    }
}

pub fn report_missing_days(table: &TimeSeriesTable, business: bool) -> Result<MissingDayReport> {
    let mode = CalendarMode::from_business(business);
    let calendar = calendar_for_mode(table, mode)?;
    let missing_days: Vec<NaiveDate> = missing_positions(&calendar, table.index())
        .into_iter()
        .map(|pos| calendar[pos])
        .collect();

    let weekday_counts = tally_weekdays(&missing_days);
    let report = MissingDayReport {
        mode,
        expected_days: calendar.len(),
        observed_days: calendar.len() - missing_days.len(),
        missing_days,
        weekday_counts,
    };

    info!(
        component = "missing_days",
        event = "missing_days.report",
        mode = mode.as_str(),
        expected_days = report.expected_days,
        observed_days = report.observed_days,
        missing_days = report.missing_days.len()
    );

    Ok(report)
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn tally_weekdays(days: &[NaiveDate]) -> Vec<WeekdayCount> {
    let mut counts = [0usize; 7];
    for day in days {
        counts[day.weekday().num_days_from_monday() as usize] += 1;
    }

    let mut out: Vec<WeekdayCount> = WEEK
        .iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|(weekday, count)| WeekdayCount {
            weekday: *weekday,
            count,
        })
        .collect();
    // Stable: equal counts keep Monday..Sunday order.
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}
