//! Time-series helpers over a date-indexed table.
//!
//! Current implemented scope:
//! - calendar ranges (all days or Monday-Friday) spanning a table's index
//! - ranking of the longest runs of missing dates
//! - forward fill onto the calendar and weekend removal
//! - missing-day reports with weekday tallies
//! - a text exploratory summary and multi-source joins

mod analyzer;
mod calendar;
mod eda;
mod error;
mod fill;
mod gaps;
mod merge;
mod missing;
mod observability;
mod table;
mod weekend;

pub use analyzer::TimeSeriesGapAnalyzer;
pub use calendar::{calendar_range, date_range, is_weekend, weekday_name, CalendarMode};
pub use eda::{
    build_eda_report, perform_eda, CellCoverage, ColumnSummary, EdaConfig, EdaReport,
    MissingnessMatrix, MissingnessRow, NumericSummary,
};
pub use error::{AnalyzerError, Result};
pub use fill::fill_forward;
pub use gaps::{find_biggest_gaps, gap_runs, GapQuery, GapRun, GapTable, DEFAULT_TOP_K};
pub use merge::{DataMerger, SourceOverview};
pub use missing::{report_missing_days, MissingDayReport, WeekdayCount};
pub use observability::{
    init_logging, log_app_start, logging_config_from_env, LogFormat, LoggingConfig,
    LoggingInitError,
};
pub use table::{parse_date_index, Column, TimeSeriesTable, Value, DEFAULT_DATE_FORMAT};
pub use weekend::remove_weekend_days;
