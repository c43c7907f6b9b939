//! Ranking of the longest runs of missing calendar dates.

use std::fmt;
use std::ops::RangeInclusive;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::calendar::{calendar_for_mode, missing_positions, CalendarMode};
use crate::error::{AnalyzerError, Result};
use crate::table::TimeSeriesTable;

pub const DEFAULT_TOP_K: usize = 5;

/// A maximal run of consecutive missing dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapRun {
    pub gap_start: NaiveDate,
    pub gap_end: NaiveDate,
    pub gap_length: usize,
}

impl GapRun {
    /// Every date of the run under the calendar it was found with.
    pub fn dates(&self, mode: CalendarMode) -> Vec<NaiveDate> {
        let mut out = Vec::with_capacity(self.gap_length);
        let mut cursor = Some(self.gap_start);
        while let Some(day) = cursor {
            if day > self.gap_end {
                break;
            }
            out.push(day);
            cursor = mode.next_after(day);
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapQuery {
    pub business: bool,
    pub k: usize,
}

impl Default for GapQuery {
    fn default() -> Self {
        Self {
            business: false,
            k: DEFAULT_TOP_K,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapTable {
    pub mode: CalendarMode,
    /// Number of runs found before truncation to `k`.
    pub total_gaps: usize,
    pub gaps: Vec<GapRun>,
}

impl GapTable {
    pub fn len(&self) -> usize {
        self.gaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gaps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GapRun> {
        self.gaps.iter()
    }
}

impl fmt::Display for GapTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.gaps.is_empty() {
            return writeln!(f, "(no gaps)");
        }
        writeln!(f, "{:<12} {:<12} {:>10}", "gap_start", "gap_end", "gap_length")?;
        for gap in &self.gaps {
            writeln!(
                f,
                "{:<12} {:<12} {:>10}",
                gap.gap_start.to_string(),
                gap.gap_end.to_string(),
                gap.gap_length
            )?;
        }
        Ok(())
    }
}

pub fn find_biggest_gaps(table: &TimeSeriesTable, business: bool, k: usize) -> Result<GapTable> {
    if k == 0 {
        return Err(AnalyzerError::InvalidArgument(
            "k must be a positive number of gaps".to_string(),
        ));
    }

    let mode = CalendarMode::from_business(business);
    let mut gaps = gap_runs(table, mode)?;
    let total_gaps = gaps.len();

    // Stable sort keeps discovery order, which is already ascending by start.
    gaps.sort_by(|a, b| {
        b.gap_length
            .cmp(&a.gap_length)
            .then(a.gap_start.cmp(&b.gap_start))
    });
    gaps.truncate(k);

    info!(
        component = "gaps",
        event = "gaps.find.finish",
        mode = mode.as_str(),
        k,
        total_gaps,
        reported_gaps = gaps.len(),
        longest_gap = gaps.first().map(|g| g.gap_length).unwrap_or(0)
    );

    Ok(GapTable {
        mode,
        total_gaps,
        gaps,
    })
}

/// All gap runs in calendar order.
pub fn gap_runs(table: &TimeSeriesTable, mode: CalendarMode) -> Result<Vec<GapRun>> {
    let calendar = calendar_for_mode(table, mode)?;
    let missing = missing_positions(&calendar, table.index());

    Ok(runs_from_positions(&missing)
        .into_iter()
        .map(|run| GapRun {
            gap_start: calendar[*run.start()],
            gap_end: calendar[*run.end()],
            gap_length: run.end() - run.start() + 1,
        })
        .collect())
}

/// Positions are calendar offsets, so adjacency here is adjacency under the
/// calendar's stepping rule (Friday and Monday are neighbours in business mode).
fn runs_from_positions(positions: &[usize]) -> Vec<RangeInclusive<usize>> {
    let mut runs = Vec::new();
    let mut iter = positions.iter().copied();
    let Some(first) = iter.next() else {
        return runs;
    };

    let mut start = first;
    let mut prev = first;
    for pos in iter {
        if pos == prev + 1 {
            prev = pos;
            continue;
        }
        runs.push(start..=prev);
        start = pos;
        prev = pos;
    }
    runs.push(start..=prev);
    runs
}
