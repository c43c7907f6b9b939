//! Weekday-only view of a table.

use tracing::debug;

use crate::calendar::is_weekend;
use crate::table::TimeSeriesTable;

/// Rows falling Monday through Friday, in their original order.
pub fn remove_weekend_days(table: &TimeSeriesTable) -> TimeSeriesTable {
    let keep: Vec<usize> = table
        .index()
        .iter()
        .enumerate()
        .filter(|(_, day)| !is_weekend(**day))
        .map(|(row, _)| row)
        .collect();

    debug!(
        component = "weekend",
        event = "weekend.remove.finish",
        input_rows = table.len(),
        dropped_rows = table.len() - keep.len()
    );

    table.select_rows(&keep)
}
