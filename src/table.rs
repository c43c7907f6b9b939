//! Date-indexed table with dynamically typed value columns.

use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AnalyzerError, Result};

/// Format accepted for textual date indexes when the caller does not pass one.
pub const DEFAULT_DATE_FORMAT: &str = "%m/%d/%Y";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// `Null` and `Float(NaN)` both count as missing.
    pub fn is_null(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) if !v.is_nan() => Some(*v),
            _ => None,
        }
    }

    pub fn dtype(&self) -> Option<&'static str> {
        match self {
            Self::Null => None,
            Self::Float(v) if v.is_nan() => None,
            Self::Bool(_) => Some("bool"),
            Self::Int(_) => Some("int"),
            Self::Float(_) => Some("float"),
            Self::Text(_) => Some("text"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) if v.is_nan() => write!(f, "NaN"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new<V: Into<Value>>(name: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn non_null_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_null()).count()
    }

    pub fn null_count(&self) -> usize {
        self.values.len() - self.non_null_count()
    }

    /// Converts textual percentages such as `"1.5%"` into `Float(1.5)`.
    ///
    /// Numbers are kept as floats and nulls stay null; any other text fails
    /// with `InvalidInput`.
    pub fn parse_percent(&self) -> Result<Self> {
        let values = self
            .values
            .iter()
            .map(|value| match value {
                Value::Text(raw) => {
                    let trimmed = raw.trim();
                    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();
                    number.parse::<f64>().map(Value::Float).map_err(|_| {
                        AnalyzerError::InvalidInput(format!(
                            "column '{}' value '{raw}' is not a percentage",
                            self.name
                        ))
                    })
                }
                Value::Bool(_) => Err(AnalyzerError::InvalidInput(format!(
                    "column '{}' holds a boolean, expected a percentage",
                    self.name
                ))),
                other if other.is_null() => Ok(Value::Null),
                other => Ok(other.as_f64().map_or(Value::Null, Value::Float)),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name: self.name.clone(),
            values,
        })
    }
}

/// A table keyed by a unique, ascending sequence of calendar dates.
///
/// Rows are sorted by date on construction; every operation in this crate
/// returns a new table and leaves the receiver untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct TimeSeriesTable {
    index: Vec<NaiveDate>,
    columns: Vec<Column>,
}

/// Wire shape of [`TimeSeriesTable`]; converted through `TimeSeriesTable::new`.
#[derive(Deserialize)]
struct RawTable {
    index: Vec<NaiveDate>,
    columns: Vec<Column>,
}

impl TryFrom<RawTable> for TimeSeriesTable {
    type Error = AnalyzerError;

    fn try_from(raw: RawTable) -> Result<Self> {
        Self::new(raw.index, raw.columns)
    }
}

impl TimeSeriesTable {
    pub fn new(index: Vec<NaiveDate>, columns: Vec<Column>) -> Result<Self> {
        let mut seen_names = HashSet::new();
        for column in &columns {
            if column.values.len() != index.len() {
                return Err(AnalyzerError::InvalidInput(format!(
                    "column '{}' has {} values, index has {} entries",
                    column.name,
                    column.values.len(),
                    index.len()
                )));
            }
            if !seen_names.insert(column.name.as_str()) {
                return Err(AnalyzerError::InvalidInput(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
        }

        let mut order: Vec<usize> = (0..index.len()).collect();
        order.sort_by_key(|&row| index[row]);
        if let Some(pair) = order.windows(2).find(|pair| index[pair[0]] == index[pair[1]]) {
            return Err(AnalyzerError::InvalidInput(format!(
                "duplicate index entry {}",
                index[pair[0]]
            )));
        }

        let table = Self { index, columns };
        if order.iter().enumerate().all(|(pos, &row)| pos == row) {
            Ok(table)
        } else {
            Ok(table.select_rows(&order))
        }
    }

    /// Table with the given columns and no rows.
    pub fn empty<S: Into<String>>(column_names: impl IntoIterator<Item = S>) -> Self {
        Self {
            index: Vec::new(),
            columns: column_names
                .into_iter()
                .map(|name| Column {
                    name: name.into(),
                    values: Vec::new(),
                })
                .collect(),
        }
    }

    /// Builds a table from a textual index, e.g. `"01/31/2024"` with
    /// [`DEFAULT_DATE_FORMAT`].
    pub fn from_date_strings<S: AsRef<str>>(
        raw_index: &[S],
        format: &str,
        columns: Vec<Column>,
    ) -> Result<Self> {
        let index = parse_date_index(raw_index, format)?;
        Self::new(index, columns)
    }

    /// Parses a table from JSON, applying the same checks as [`Self::new`].
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawTable = serde_json::from_str(json)?;
        raw.try_into()
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.index.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.index.last().copied()
    }

    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.index.binary_search(&date).ok()
    }

    pub fn value(&self, date: NaiveDate, column: &str) -> Option<&Value> {
        let row = self.position(date)?;
        self.column(column).map(|c| &c.values[row])
    }

    pub fn null_cells(&self) -> usize {
        self.columns.iter().map(Column::null_count).sum()
    }

    /// Copy of the rows at `positions`, in the given order.
    pub(crate) fn select_rows(&self, positions: &[usize]) -> Self {
        Self {
            index: positions.iter().map(|&row| self.index[row]).collect(),
            columns: self
                .columns
                .iter()
                .map(|column| Column {
                    name: column.name.clone(),
                    values: positions
                        .iter()
                        .map(|&row| column.values[row].clone())
                        .collect(),
                })
                .collect(),
        }
    }

    /// Conforms the table to `dates` (ascending, unique). Dates absent from
    /// the table get null cells; rows whose date is not listed are dropped.
    pub(crate) fn reindex(&self, dates: &[NaiveDate]) -> Self {
        let rows: Vec<Option<usize>> = dates.iter().map(|date| self.position(*date)).collect();
        Self {
            index: dates.to_vec(),
            columns: self
                .columns
                .iter()
                .map(|column| Column {
                    name: column.name.clone(),
                    values: rows
                        .iter()
                        .map(|row| match row {
                            Some(row) => column.values[*row].clone(),
                            None => Value::Null,
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub(crate) fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub(crate) fn with_column_suffix(&self, suffix: &str) -> Self {
        Self {
            index: self.index.clone(),
            columns: self
                .columns
                .iter()
                .map(|column| Column {
                    name: format!("{}_{suffix}", column.name),
                    values: column.values.clone(),
                })
                .collect(),
        }
    }
}

impl fmt::Display for TimeSeriesTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<10}", "date")?;
        for column in &self.columns {
            write!(f, " {:>12}", column.name)?;
        }
        writeln!(f)?;
        for (row, date) in self.index.iter().enumerate() {
            write!(f, "{date}")?;
            for column in &self.columns {
                write!(f, " {:>12}", column.values[row].to_string())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

pub fn parse_date_index<S: AsRef<str>>(raw_index: &[S], format: &str) -> Result<Vec<NaiveDate>> {
    raw_index
        .iter()
        .map(|raw| {
            let raw = raw.as_ref().trim();
            NaiveDate::parse_from_str(raw, format).map_err(|_| {
                AnalyzerError::InvalidInput(format!(
                    "index entry '{raw}' is not a date in format '{format}'"
                ))
            })
        })
        .collect()
}
