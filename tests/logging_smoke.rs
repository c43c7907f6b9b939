use std::io;
use std::io::Write;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tracing::dispatcher::with_default;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriter;
use ts_wrangler::{
    log_app_start, Column, DataMerger, LoggingConfig, TimeSeriesGapAnalyzer, TimeSeriesTable,
};

#[derive(Clone, Default)]
struct SharedWriter {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedWriter {
    fn output_string(&self) -> String {
        let bytes = self
            .inner
            .lock()
            .expect("writer lock should not be poisoned");
        String::from_utf8_lossy(&bytes).to_string()
    }
}

struct SharedWriterGuard {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl<'a> MakeWriter<'a> for SharedWriter {
    type Writer = SharedWriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        SharedWriterGuard {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Write for SharedWriterGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut out = self
            .inner
            .lock()
            .expect("writer lock should not be poisoned");
        out.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture_logs(max_level: Level, f: impl FnOnce()) -> String {
    let writer = SharedWriter::default();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_max_level(max_level)
        .with_writer(writer.clone())
        .finish();
    let dispatch = tracing::Dispatch::new(subscriber);

    with_default(&dispatch, f);
    writer.output_string()
}

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, day).expect("valid date")
}

fn gappy_table() -> TimeSeriesTable {
    TimeSeriesTable::new(
        vec![d(3), d(4), d(7), d(12)],
        vec![Column::new("close", [1.0, 2.0, 3.0, 4.0])],
    )
    .expect("table should build")
}

#[test]
fn analyzer_operations_emit_structured_events() {
    let table = gappy_table();
    let logs = capture_logs(Level::INFO, || {
        let analyzer = TimeSeriesGapAnalyzer::new(&table);
        analyzer.find_biggest_gaps(false, 5).expect("gaps");
        analyzer.fill_forward(true).expect("fill");
        analyzer.report_missing_days(true).expect("report");
        analyzer.eda_report().expect("eda");
    });

    assert!(logs.contains("\"event\":\"gaps.find.finish\""));
    assert!(logs.contains("\"event\":\"fill.forward.finish\""));
    assert!(logs.contains("\"event\":\"missing_days.report\""));
    assert!(logs.contains("\"event\":\"eda.report.built\""));
    assert!(logs.contains("\"mode\":\"business_days\""));
}

#[test]
fn weekend_removal_logs_only_at_debug() {
    let table = gappy_table();
    let info_logs = capture_logs(Level::INFO, || {
        TimeSeriesGapAnalyzer::new(&table).remove_weekend_days();
    });
    assert!(!info_logs.contains("weekend.remove.finish"));

    let debug_logs = capture_logs(Level::DEBUG, || {
        TimeSeriesGapAnalyzer::new(&table).remove_weekend_days();
    });
    assert!(debug_logs.contains("\"event\":\"weekend.remove.finish\""));
}

#[test]
fn empty_table_logs_calendar_rejection() {
    let table = TimeSeriesTable::empty(["close"]);
    let logs = capture_logs(Level::INFO, || {
        let err = TimeSeriesGapAnalyzer::new(&table).report_missing_days(false);
        assert!(err.is_err());
    });

    assert!(logs.contains("\"event\":\"calendar.invalid_input\""));
    assert!(logs.contains("\"reason\":\"empty_index\""));
}

#[test]
fn merger_and_app_start_emit_baseline_events() {
    let logs = capture_logs(Level::INFO, || {
        log_app_start("eda_demo", &LoggingConfig::default());

        let merger = DataMerger::new(vec![
            ("a".to_string(), gappy_table()),
            (
                "b".to_string(),
                TimeSeriesTable::new(vec![d(20)], vec![Column::new("close", [9.0])])
                    .expect("table"),
            ),
        ])
        .expect("merger");
        merger.merge_outer().expect("outer");
        assert!(merger.merge_inner().expect("inner").is_none());
    });

    assert!(logs.contains("\"event\":\"app.start\""));
    assert!(logs.contains("\"event\":\"merge.outer.finish\""));
    assert!(logs.contains("\"event\":\"merge.inner.empty\""));
}
