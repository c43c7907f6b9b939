//! Exploratory summary of a date-indexed table.
//!
//! The report combines:
//! - an overview (date span, row count, per-column info and numeric stats)
//! - a text histogram per numeric column
//! - a missingness matrix over the all-days calendar
//! - the missing-day report and the biggest gaps under both calendar modes

use std::collections::BTreeSet;
use std::fmt;
use std::io::Write;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::calendar::{calendar_for_mode, missing_positions, CalendarMode};
use crate::error::{AnalyzerError, Result};
use crate::gaps::{find_biggest_gaps, GapTable, DEFAULT_TOP_K};
use crate::missing::{report_missing_days, MissingDayReport};
use crate::table::{Column, TimeSeriesTable};

const HISTOGRAM_BAR_WIDTH: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdaConfig {
    pub top_k: usize,
    pub histogram_bins: usize,
    /// Upper bound on matrix lines; longer calendars are bucketed.
    pub matrix_max_rows: usize,
}

impl Default for EdaConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            histogram_bins: 10,
            matrix_max_rows: 40,
        }
    }
}

impl EdaConfig {
    fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(AnalyzerError::InvalidArgument(
                "top_k must be > 0".to_string(),
            ));
        }
        if self.histogram_bins == 0 {
            return Err(AnalyzerError::InvalidArgument(
                "histogram_bins must be > 0".to_string(),
            ));
        }
        if self.matrix_max_rows == 0 {
            return Err(AnalyzerError::InvalidArgument(
                "matrix_max_rows must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` below two observations.
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub histogram: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: String,
    pub non_null: usize,
    pub null: usize,
    pub numeric: Option<NumericSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellCoverage {
    Full,
    Partial,
    Empty,
}

impl CellCoverage {
    fn symbol(self) -> char {
        match self {
            Self::Full => '#',
            Self::Partial => ':',
            Self::Empty => '.',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingnessRow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub cells: Vec<CellCoverage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingnessMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<MissingnessRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdaReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
    pub null_cells: usize,
    pub missing_calendar_days: usize,
    /// Null cells once the table is laid over every calendar day.
    pub total_missing_cells: usize,
    pub missing_days: MissingDayReport,
    pub business_gaps: GapTable,
    pub all_day_gaps: GapTable,
    pub missingness: MissingnessMatrix,
}

impl EdaReport {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn build_eda_report(table: &TimeSeriesTable, cfg: &EdaConfig) -> Result<EdaReport> {
    cfg.validate()?;

    let calendar = calendar_for_mode(table, CalendarMode::AllDays)?;
    let missing_calendar_days = missing_positions(&calendar, table.index()).len();
    let grid = table.reindex(&calendar);

    let (start_date, end_date) = match (table.first_date(), table.last_date()) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            return Err(AnalyzerError::InvalidInput(
                "table index is empty".to_string(),
            ))
        }
    };

    let report = EdaReport {
        start_date,
        end_date,
        rows: table.len(),
        columns: table
            .columns()
            .iter()
            .map(|column| summarize_column(column, cfg.histogram_bins))
            .collect(),
        null_cells: table.null_cells(),
        missing_calendar_days,
        total_missing_cells: grid.null_cells(),
        missing_days: report_missing_days(table, true)?,
        business_gaps: find_biggest_gaps(table, true, cfg.top_k)?,
        all_day_gaps: find_biggest_gaps(table, false, cfg.top_k)?,
        missingness: missingness_matrix(&grid, cfg.matrix_max_rows),
    };

    info!(
        component = "eda",
        event = "eda.report.built",
        rows = report.rows,
        columns = report.columns.len(),
        null_cells = report.null_cells,
        missing_calendar_days = report.missing_calendar_days,
        total_missing_cells = report.total_missing_cells
    );

    Ok(report)
}

/// Writes the text rendering of [`build_eda_report`] to `out`.
pub fn perform_eda<W: Write>(table: &TimeSeriesTable, cfg: &EdaConfig, out: &mut W) -> Result<()> {
    let report = build_eda_report(table, cfg)?;
    write!(out, "{report}")?;
    out.flush()?;
    Ok(())
}

fn summarize_column(column: &Column, bins: usize) -> ColumnSummary {
    let dtypes: BTreeSet<&'static str> = column.values.iter().filter_map(|v| v.dtype()).collect();
    let dtype = match dtypes.len() {
        0 => "empty",
        1 => dtypes.iter().next().copied().unwrap_or("empty"),
        2 if dtypes.contains("int") && dtypes.contains("float") => "float",
        _ => "mixed",
    };

    let numbers: Vec<f64> = column.values.iter().filter_map(|v| v.as_f64()).collect();
    let numeric = if matches!(dtype, "int" | "float") {
        numeric_summary(&numbers, bins)
    } else {
        None
    };

    ColumnSummary {
        name: column.name.clone(),
        dtype: dtype.to_string(),
        non_null: column.non_null_count(),
        null: column.null_count(),
        numeric,
    }
}

fn numeric_summary(values: &[f64], bins: usize) -> Option<NumericSummary> {
    if values.is_empty() {
        return None;
    }

    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let std = (count > 1).then(|| {
        let sum_sq = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>();
        (sum_sq / (count - 1) as f64).sqrt()
    });
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut histogram = vec![0usize; bins];
    let width = (max - min) / bins as f64;
    for v in values {
        let bin = if width > 0.0 {
            (((v - min) / width).floor() as usize).min(bins - 1)
        } else {
            0
        };
        histogram[bin] += 1;
    }

    Some(NumericSummary {
        count,
        mean,
        std,
        min,
        max,
        histogram,
    })
}

fn missingness_matrix(grid: &TimeSeriesTable, max_rows: usize) -> MissingnessMatrix {
    let columns: Vec<String> = grid.columns().iter().map(|c| c.name.clone()).collect();
    let total = grid.len();
    let chunk = total.div_ceil(max_rows).max(1);

    let rows = (0..total)
        .step_by(chunk)
        .map(|start| {
            let end = (start + chunk).min(total);
            let cells = grid
                .columns()
                .iter()
                .map(|column| {
                    let present = column.values[start..end]
                        .iter()
                        .filter(|v| !v.is_null())
                        .count();
                    if present == end - start {
                        CellCoverage::Full
                    } else if present == 0 {
                        CellCoverage::Empty
                    } else {
                        CellCoverage::Partial
                    }
                })
                .collect();
            MissingnessRow {
                start: grid.index()[start],
                end: grid.index()[end - 1],
                cells,
            }
        })
        .collect();

    MissingnessMatrix { columns, rows }
}

impl fmt::Display for MissingnessMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "legend: '#' present, ':' partly missing, '.' missing")?;
        for (idx, name) in self.columns.iter().enumerate() {
            writeln!(f, "  [{idx}] {name}")?;
        }
        for row in &self.rows {
            let cells: Vec<String> = row.cells.iter().map(|c| c.symbol().to_string()).collect();
            if row.start == row.end {
                writeln!(f, "{:<22} {}", row.start.to_string(), cells.join(" "))?;
            } else {
                writeln!(
                    f,
                    "{:<22} {}",
                    format!("{}..{}", row.start, row.end),
                    cells.join(" ")
                )?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for EdaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "===OVERVIEW===")?;
        writeln!(f, "Start Date: {}", self.start_date)?;
        writeln!(f, "End Date: {}", self.end_date)?;
        writeln!(f, "Rows: {}", self.rows)?;
        writeln!(f)?;
        writeln!(f, "Info:")?;
        writeln!(f, "{:<16} {:<8} {:>9} {:>6}", "column", "dtype", "non-null", "null")?;
        for column in &self.columns {
            writeln!(
                f,
                "{:<16} {:<8} {:>9} {:>6}",
                column.name, column.dtype, column.non_null, column.null
            )?;
        }

        let numeric: Vec<(&str, &NumericSummary)> = self
            .columns
            .iter()
            .filter_map(|c| c.numeric.as_ref().map(|n| (c.name.as_str(), n)))
            .collect();
        if !numeric.is_empty() {
            writeln!(f)?;
            writeln!(f, "Describe:")?;
            writeln!(
                f,
                "{:<16} {:>6} {:>12} {:>12} {:>12} {:>12}",
                "column", "count", "mean", "std", "min", "max"
            )?;
            for (name, summary) in &numeric {
                let std = summary
                    .std
                    .map(|s| format!("{s:.4}"))
                    .unwrap_or_else(|| "NaN".to_string());
                writeln!(
                    f,
                    "{:<16} {:>6} {:>12.4} {:>12} {:>12.4} {:>12.4}",
                    name, summary.count, summary.mean, std, summary.min, summary.max
                )?;
            }

            writeln!(f)?;
            writeln!(f, "Histograms:")?;
            for (name, summary) in &numeric {
                writeln!(f, "{name}")?;
                let peak = summary.histogram.iter().copied().max().unwrap_or(0).max(1);
                let width = (summary.max - summary.min) / summary.histogram.len() as f64;
                for (bin, count) in summary.histogram.iter().enumerate() {
                    let lower = summary.min + width * bin as f64;
                    let bar = "*".repeat(count * HISTOGRAM_BAR_WIDTH / peak);
                    writeln!(f, "  {lower:>12.4} | {bar} {count}")?;
                }
            }
        }

        writeln!(f)?;
        writeln!(f, "===MISSING ROWS===")?;
        writeln!(f, "Null cells: {}", self.null_cells)?;
        writeln!(f, "Missing calendar days: {}", self.missing_calendar_days)?;
        writeln!(f, "Total missing cells: {}", self.total_missing_cells)?;
        write!(f, "{}", self.missingness)?;
        writeln!(f)?;
        write!(f, "{}", self.missing_days)?;
        writeln!(f)?;
        writeln!(f, "Business gaps:")?;
        write!(f, "{}", self.business_gaps)?;
        writeln!(f)?;
        writeln!(f, "All days gaps:")?;
        write!(f, "{}", self.all_day_gaps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn numeric_summary_matches_sample_statistics() {
        let summary = numeric_summary(&[1.0, 2.0, 3.0, 4.0], 2).unwrap();
        assert_eq!(summary.count, 4);
        assert!((summary.mean - 2.5).abs() < 1e-12);
        assert!((summary.std.unwrap() - 1.290_994_448_735_805_6).abs() < 1e-12);
        assert_eq!(summary.histogram, vec![2, 2]);

        let single = numeric_summary(&[7.0], 3).unwrap();
        assert_eq!(single.std, None);
        assert_eq!(single.histogram, vec![1, 0, 0]);
    }

    #[test]
    fn dtype_inference_widens_int_and_float() {
        let mixed_numeric = Column::new("n", [Value::Int(1), Value::Float(2.5), Value::Null]);
        let summary = summarize_column(&mixed_numeric, 4);
        assert_eq!(summary.dtype, "float");
        assert_eq!(summary.null, 1);
        assert!(summary.numeric.is_some());

        let text = Column::new("t", [Value::from("a"), Value::Int(1)]);
        let summary = summarize_column(&text, 4);
        assert_eq!(summary.dtype, "mixed");
        assert!(summary.numeric.is_none());
    }

    #[test]
    fn matrix_buckets_long_calendars() {
        let dates: Vec<NaiveDate> = (1..=10).map(|day| d(2022, 1, day)).collect();
        let values: Vec<Value> = (1..=10)
            .map(|day| if day > 6 { Value::Null } else { Value::Int(day) })
            .collect();
        let grid = TimeSeriesTable::new(dates, vec![Column::new("v", values)]).unwrap();

        let matrix = missingness_matrix(&grid, 4);
        assert_eq!(matrix.rows.len(), 4);
        assert_eq!(matrix.rows[0].start, d(2022, 1, 1));
        assert_eq!(matrix.rows[0].end, d(2022, 1, 3));
        assert_eq!(
            matrix
                .rows
                .iter()
                .map(|row| row.cells[0])
                .collect::<Vec<_>>(),
            vec![
                CellCoverage::Full,
                CellCoverage::Full,
                CellCoverage::Empty,
                CellCoverage::Empty,
            ]
        );
    }

    #[test]
    fn zero_bins_are_rejected() {
        let table = TimeSeriesTable::new(vec![d(2022, 1, 3)], vec![Column::new("v", [1.0])]).unwrap();
        let cfg = EdaConfig {
            histogram_bins: 0,
            ..EdaConfig::default()
        };
        assert!(matches!(
            build_eda_report(&table, &cfg),
            Err(AnalyzerError::InvalidArgument(_))
        ));
    }
}
