use std::io::Write;

use chrono::NaiveDate;

use crate::calendar;
use crate::eda::{self, EdaConfig, EdaReport};
use crate::error::Result;
use crate::fill;
use crate::gaps::{self, GapQuery, GapTable};
use crate::missing::{self, MissingDayReport};
use crate::table::TimeSeriesTable;
use crate::weekend;

/// Time-series helpers bound to one borrowed table.
///
/// Every method reads the table and returns freshly built results, so several
/// analyzers can share the same table.
#[derive(Debug, Clone, Copy)]
pub struct TimeSeriesGapAnalyzer<'a> {
    table: &'a TimeSeriesTable,
    config: EdaConfig,
}

impl<'a> TimeSeriesGapAnalyzer<'a> {
    pub fn new(table: &'a TimeSeriesTable) -> Self {
        Self {
            table,
            config: EdaConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EdaConfig) -> Self {
        self.config = config;
        self
    }

    pub fn table(&self) -> &'a TimeSeriesTable {
        self.table
    }

    pub fn config(&self) -> &EdaConfig {
        &self.config
    }

    pub fn calendar_range(&self, business: bool) -> Result<Vec<NaiveDate>> {
        calendar::calendar_range(self.table, business)
    }

    pub fn find_biggest_gaps(&self, business: bool, k: usize) -> Result<GapTable> {
        gaps::find_biggest_gaps(self.table, business, k)
    }

    pub fn find_gaps(&self, query: GapQuery) -> Result<GapTable> {
        gaps::find_biggest_gaps(self.table, query.business, query.k)
    }

    pub fn fill_forward(&self, business: bool) -> Result<TimeSeriesTable> {
        fill::fill_forward(self.table, business)
    }

    pub fn remove_weekend_days(&self) -> TimeSeriesTable {
        weekend::remove_weekend_days(self.table)
    }

    pub fn report_missing_days(&self, business: bool) -> Result<MissingDayReport> {
        missing::report_missing_days(self.table, business)
    }

    pub fn eda_report(&self) -> Result<EdaReport> {
        eda::build_eda_report(self.table, &self.config)
    }

    pub fn perform_eda<W: Write>(&self, out: &mut W) -> Result<()> {
        eda::perform_eda(self.table, &self.config, out)
    }
}
