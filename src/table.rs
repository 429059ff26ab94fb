//! Table View - filtered rows in a JSON-friendly shape

use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Filtered rows as shipped to the table display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableView {
    /// Column names in frame order
    pub columns: Vec<String>,

    /// One JSON object per row, capped at the configured limit
    pub rows: Vec<Value>,

    /// Rows in the filtered subset before the cap
    pub total_rows: usize,

    /// Whether `rows` was cut short
    pub truncated: bool,
}

impl TableView {
    pub fn from_frame(df: &DataFrame, row_limit: usize) -> Result<Self> {
        let total_rows = df.height();
        let shown = if total_rows > row_limit {
            df.head(Some(row_limit))
        } else {
            df.clone()
        };

        Ok(Self {
            columns: column_names(df),
            rows: dataframe_to_rows(&shown)?,
            total_rows,
            truncated: total_rows > row_limit,
        })
    }
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

/// Convert DataFrame rows to JSON objects keyed by column name
pub fn dataframe_to_rows(df: &DataFrame) -> Result<Vec<Value>> {
    let mut rows = Vec::with_capacity(df.height());

    for row_idx in 0..df.height() {
        let row = df
            .get_columns()
            .iter()
            .map(|series| -> Result<(String, Value)> {
                Ok((series.name().to_string(), cell_to_json(series.get(row_idx)?)))
            })
            .collect::<Result<Map<String, Value>>>()?;
        rows.push(Value::Object(row));
    }

    Ok(rows)
}

/// Numbers stay numbers, text stays text; non-finite floats become null
/// and anything else (dates, durations) goes through its display form.
fn cell_to_json(cell: AnyValue<'_>) -> Value {
    match cell {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::String(s) => Value::from(s),
        AnyValue::StringOwned(s) => Value::from(s.as_str()),
        number if number.dtype().is_float() => number
            .extract::<f64>()
            .and_then(Number::from_f64)
            .map_or(Value::Null, Value::Number),
        number if number.dtype().is_numeric() => number
            .extract::<i64>()
            .map(Value::from)
            .or_else(|| number.extract::<u64>().map(Value::from))
            .unwrap_or(Value::Null),
        other => Value::String(other.to_string()),
    }
}
