//! Reindexing onto the expected calendar with forward fill.

use chrono::NaiveDate;
use tracing::info;

use crate::calendar::{calendar_for_mode, CalendarMode};
use crate::error::Result;
use crate::table::{TimeSeriesTable, Value};

/// Reindexes `table` onto its calendar range and carries the last observed
/// value of each column forward into missing cells.
///
/// Each calendar date takes the latest non-null value at or before it, read
/// from every original row. In business mode weekend rows are not in the
/// result but still carry into the following weekdays. Cells before a
/// column's first observation stay null.
pub fn fill_forward(table: &TimeSeriesTable, business: bool) -> Result<TimeSeriesTable> {
    if table.is_empty() {
        return Ok(table.clone());
    }

    let mode = CalendarMode::from_business(business);
    let calendar = calendar_for_mode(table, mode)?;
    let mut filled = table.reindex(&calendar);

    let mut filled_cells = 0usize;
    for column in filled.columns_mut() {
        let Some(source) = table.column(&column.name) else {
            continue;
        };
        filled_cells += carry_forward(table.index(), &source.values, &calendar, &mut column.values);
    }

    let introduced_rows = calendar
        .iter()
        .filter(|day| table.position(**day).is_none())
        .count();

    info!(
        component = "fill",
        event = "fill.forward.finish",
        mode = mode.as_str(),
        input_rows = table.len(),
        output_rows = filled.len(),
        introduced_rows,
        filled_cells
    );

    Ok(filled)
}

/// Writes into `out[i]` the latest non-null `values` entry dated at or before
/// `calendar[i]` when `out[i]` is null. Returns the number of cells written.
fn carry_forward(
    index: &[NaiveDate],
    values: &[Value],
    calendar: &[NaiveDate],
    out: &mut [Value],
) -> usize {
    let mut rows = index.iter().zip(values).peekable();
    let mut last_seen: Option<&Value> = None;
    let mut filled = 0;
    for (day, cell) in calendar.iter().zip(out.iter_mut()) {
        while let Some((_, value)) = rows.next_if(|(date, _)| *date <= day) {
            if !value.is_null() {
                last_seen = Some(value);
            }
        }
        if cell.is_null() {
            if let Some(prev) = last_seen {
                *cell = prev.clone();
                filled += 1;
            }
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn leading_nulls_are_not_back_filled() {
        let index: Vec<NaiveDate> = (3..=7).map(|day| d(2022, 1, day)).collect();
        let values = vec![
            Value::Null,
            Value::Float(1.0),
            Value::Float(f64::NAN),
            Value::Null,
            Value::Float(4.0),
        ];
        let mut out = values.clone();
        assert_eq!(carry_forward(&index, &values, &index, &mut out), 2);
        assert_eq!(
            out,
            vec![
                Value::Null,
                Value::Float(1.0),
                Value::Float(1.0),
                Value::Float(1.0),
                Value::Float(4.0),
            ]
        );
    }

    #[test]
    fn off_calendar_rows_carry_into_later_dates() {
        // Sat 01-08 and Sun 01-09 feed Mon 01-10; the Sunday null does not
        // overwrite Saturday's value.
        let index = vec![d(2022, 1, 7), d(2022, 1, 8), d(2022, 1, 9)];
        let values = vec![Value::Int(1), Value::Int(2), Value::Null];
        let calendar = vec![d(2022, 1, 7), d(2022, 1, 10), d(2022, 1, 11)];
        let mut out = vec![Value::Int(1), Value::Null, Value::Null];

        assert_eq!(carry_forward(&index, &values, &calendar, &mut out), 2);
        assert_eq!(out, vec![Value::Int(1), Value::Int(2), Value::Int(2)]);
    }

    #[test]
    fn existing_nulls_are_filled_per_column() {
        let table = TimeSeriesTable::new(
            vec![d(2022, 1, 3), d(2022, 1, 4), d(2022, 1, 6)],
            vec![
                Column::new("a", [Some(1i64), None, Some(3)]),
                Column::new("b", [None, Some("x"), None]),
            ],
        )
        .unwrap();

        let out = fill_forward(&table, true).unwrap();
        assert_eq!(out.index(), &[d(2022, 1, 3), d(2022, 1, 4), d(2022, 1, 5), d(2022, 1, 6)]);
        assert_eq!(
            out.column("a").unwrap().values,
            vec![Value::Int(1), Value::Int(1), Value::Int(1), Value::Int(3)]
        );
        assert_eq!(
            out.column("b").unwrap().values,
            vec![
                Value::Null,
                Value::from("x"),
                Value::from("x"),
                Value::from("x")
            ]
        );
    }

    #[test]
    fn empty_table_is_returned_unchanged() {
        let table = TimeSeriesTable::empty(["value"]);
        let out = fill_forward(&table, true).unwrap();
        assert_eq!(out, table);
    }
}
