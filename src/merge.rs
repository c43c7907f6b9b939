//! Joins several named tables on their date index.

use std::collections::{BTreeSet, HashSet};
use std::io::Write;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AnalyzerError, Result};
use crate::table::{Column, TimeSeriesTable};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceOverview {
    pub name: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub rows: usize,
    pub null_cells: usize,
}

/// Named tables whose columns carry a `_{source}` suffix.
#[derive(Debug, Clone)]
pub struct DataMerger {
    sources: Vec<(String, TimeSeriesTable)>,
}

impl DataMerger {
    pub fn new(sources: Vec<(String, TimeSeriesTable)>) -> Result<Self> {
        let mut seen = HashSet::new();
        for (name, _) in &sources {
            if name.trim().is_empty() {
                return Err(AnalyzerError::InvalidArgument(
                    "source name must not be empty".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(AnalyzerError::InvalidArgument(format!(
                    "duplicate source name '{name}'"
                )));
            }
        }

        let sources = sources
            .iter()
            .map(|(name, table)| (name.clone(), table.with_column_suffix(name)))
            .collect();
        Ok(Self { sources })
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn source(&self, name: &str) -> Option<&TimeSeriesTable> {
        self.sources
            .iter()
            .find(|(source, _)| source == name)
            .map(|(_, table)| table)
    }

    pub fn overviews(&self) -> Vec<SourceOverview> {
        self.sources
            .iter()
            .map(|(name, table)| SourceOverview {
                name: name.clone(),
                start: table.first_date(),
                end: table.last_date(),
                rows: table.len(),
                null_cells: table.null_cells(),
            })
            .collect()
    }

    /// Union of all indexes; cells a source does not cover are null.
    pub fn merge_outer(&self) -> Result<TimeSeriesTable> {
        let index: Vec<NaiveDate> = self
            .sources
            .iter()
            .flat_map(|(_, table)| table.index().iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let merged = self.join_on(index)?;
        info!(
            component = "merge",
            event = "merge.outer.finish",
            sources = self.sources.len(),
            rows = merged.len(),
            columns = merged.columns().len()
        );
        Ok(merged)
    }

    /// Intersection of all indexes, or `None` when no date is shared.
    pub fn merge_inner(&self) -> Result<Option<TimeSeriesTable>> {
        let mut shared: Option<BTreeSet<NaiveDate>> = None;
        for (_, table) in &self.sources {
            let dates: BTreeSet<NaiveDate> = table.index().iter().copied().collect();
            shared = Some(match shared {
                Some(acc) => acc.intersection(&dates).copied().collect(),
                None => dates,
            });
        }
        let index: Vec<NaiveDate> = shared.unwrap_or_default().into_iter().collect();

        if index.is_empty() {
            info!(
                component = "merge",
                event = "merge.inner.empty",
                sources = self.sources.len()
            );
            return Ok(None);
        }

        let merged = self.join_on(index)?;
        info!(
            component = "merge",
            event = "merge.inner.finish",
            sources = self.sources.len(),
            rows = merged.len(),
            start = %merged.index()[0],
            end = %merged.index()[merged.len() - 1]
        );
        Ok(Some(merged))
    }

    pub fn perform_eda<W: Write>(&self, out: &mut W) -> Result<()> {
        for (name, table) in &self.sources {
            writeln!(out, "\nExploratory Data Analysis for {name}:")?;
            match (table.first_date(), table.last_date()) {
                (Some(start), Some(end)) => {
                    writeln!(out, "Start Date: {start}")?;
                    writeln!(out, "End Date: {end}")?;
                }
                _ => writeln!(out, "(no rows)")?,
            }
            writeln!(out, "\nInfo:")?;
            writeln!(out, "Rows: {}", table.len())?;
            for column in table.columns() {
                writeln!(
                    out,
                    "  {:<24} {:>8} non-null",
                    column.name,
                    column.non_null_count()
                )?;
            }
        }
        out.flush()?;
        Ok(())
    }

    /// Stacked bars showing each source's date span over the union span.
    pub fn render_overlap<W: Write>(&self, out: &mut W, width: usize) -> Result<()> {
        if width == 0 {
            return Err(AnalyzerError::InvalidArgument(
                "overlap chart width must be > 0".to_string(),
            ));
        }

        let spans: Vec<(&str, NaiveDate, NaiveDate)> = self
            .sources
            .iter()
            .filter_map(|(name, table)| Some((name.as_str(), table.first_date()?, table.last_date()?)))
            .collect();
        let (Some(lo), Some(hi)) = (
            spans.iter().map(|(_, start, _)| *start).min(),
            spans.iter().map(|(_, _, end)| *end).max(),
        ) else {
            writeln!(out, "(no dated sources)")?;
            return Ok(());
        };

        let total_days = (hi - lo).num_days().max(1) as f64;
        let label_width = spans.iter().map(|(name, _, _)| name.len()).max().unwrap_or(0);
        let slot = |date: NaiveDate| -> usize {
            let offset = (date - lo).num_days() as f64 / total_days;
            ((offset * (width - 1) as f64).round() as usize).min(width - 1)
        };

        writeln!(out, "Time overlap ({lo} .. {hi})")?;
        for (name, start, end) in &spans {
            let (from, to) = (slot(*start), slot(*end));
            let bar: String = (0..width)
                .map(|i| if i >= from && i <= to { '=' } else { ' ' })
                .collect();
            writeln!(out, "{name:<label_width$} |{bar}| {start} .. {end}")?;
        }
        out.flush()?;
        Ok(())
    }

    fn join_on(&self, index: Vec<NaiveDate>) -> Result<TimeSeriesTable> {
        let columns: Vec<Column> = self
            .sources
            .iter()
            .flat_map(|(_, table)| table.reindex(&index).into_columns())
            .collect();
        TimeSeriesTable::new(index, columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn source(days: &[u32], values: &[f64]) -> TimeSeriesTable {
        TimeSeriesTable::new(
            days.iter().map(|day| d(2022, 1, *day)).collect(),
            vec![Column::new("close", values.to_vec())],
        )
        .unwrap()
    }

    #[test]
    fn columns_are_suffixed_with_source_name() {
        let merger = DataMerger::new(vec![
            ("btc".to_string(), source(&[1, 2], &[1.0, 2.0])),
            ("eth".to_string(), source(&[2, 3], &[20.0, 30.0])),
        ])
        .unwrap();

        let outer = merger.merge_outer().unwrap();
        assert_eq!(outer.column_names(), vec!["close_btc", "close_eth"]);
        assert_eq!(outer.index(), &[d(2022, 1, 1), d(2022, 1, 2), d(2022, 1, 3)]);
        assert_eq!(
            outer.column("close_eth").unwrap().values,
            vec![Value::Null, Value::Float(20.0), Value::Float(30.0)]
        );

        let inner = merger.merge_inner().unwrap().unwrap();
        assert_eq!(inner.index(), &[d(2022, 1, 2)]);
        assert_eq!(inner.value(d(2022, 1, 2), "close_btc"), Some(&Value::Float(2.0)));
    }

    #[test]
    fn disjoint_sources_have_no_inner_join() {
        let merger = DataMerger::new(vec![
            ("a".to_string(), source(&[1], &[1.0])),
            ("b".to_string(), source(&[5], &[5.0])),
        ])
        .unwrap();
        assert!(merger.merge_inner().unwrap().is_none());
    }

    #[test]
    fn duplicate_or_blank_names_are_rejected() {
        let dup = DataMerger::new(vec![
            ("a".to_string(), source(&[1], &[1.0])),
            ("a".to_string(), source(&[2], &[2.0])),
        ]);
        assert!(matches!(dup, Err(AnalyzerError::InvalidArgument(_))));

        let blank = DataMerger::new(vec![(" ".to_string(), source(&[1], &[1.0]))]);
        assert!(matches!(blank, Err(AnalyzerError::InvalidArgument(_))));
    }

    #[test]
    fn overlap_chart_marks_each_span() {
        let merger = DataMerger::new(vec![
            ("early".to_string(), source(&[1, 5], &[1.0, 5.0])),
            ("late".to_string(), source(&[5, 9], &[5.0, 9.0])),
        ])
        .unwrap();

        let mut out = Vec::new();
        merger.render_overlap(&mut out, 9).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("early |=====    | 2022-01-01 .. 2022-01-05"));
        assert!(text.contains("late  |    =====| 2022-01-05 .. 2022-01-09"));
    }
}
