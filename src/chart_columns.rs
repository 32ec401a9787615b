//! Default chart axis selection from a freshly fetched page.
//!
//! The service has no schema endpoint, so column types are sniffed from a
//! small row sample. This heuristic stays behind `infer_chart_columns` so a
//! real schema endpoint could replace it without touching the controller.

use serde_json::Value;

use crate::api::Row;
use crate::view_state::ChartSpec;

/// How many leading rows of the current page are sampled for numeric sniffing.
const SAMPLE_ROWS: usize = 5;

/// True for values the chart endpoint can sum: JSON numbers, or strings
/// that parse as finite floats (CSV uploads often arrive stringly typed).
fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => s.trim().parse::<f64>().map(|v| v.is_finite()).unwrap_or(false),
        _ => false,
    }
}

/// First column with a numeric value in any sampled row, in column order.
fn first_numeric_column(columns: &[String], rows: &[Row]) -> Option<String> {
    let sample = &rows[..rows.len().min(SAMPLE_ROWS)];
    columns
        .iter()
        .find(|c| {
            sample
                .iter()
                .any(|row| row.get(c.as_str()).map(is_numeric).unwrap_or(false))
        })
        .cloned()
}

/// Corrects a chart spec against a new column set.
///
/// An axis already set to a column that still exists is left alone, even if
/// a better candidate exists; only absent or invalid selections are
/// replaced. X defaults to the first column. Y defaults to the first column
/// with a numeric sample, then `columns[1]`, then `columns[0]` when only one
/// column exists. An empty column set clears both axes. X and Y ending up
/// equal is allowed; the service decides what a degenerate projection means.
pub fn infer_chart_columns(current: &ChartSpec, columns: &[String], rows: &[Row]) -> ChartSpec {
    if columns.is_empty() {
        return ChartSpec {
            chart_type: current.chart_type,
            x_column: None,
            y_column: None,
        };
    }

    let valid = |axis: &Option<String>| {
        axis.as_ref()
            .map(|c| columns.contains(c))
            .unwrap_or(false)
    };

    let x_column = if valid(&current.x_column) {
        current.x_column.clone()
    } else {
        Some(columns[0].clone())
    };

    let y_column = if valid(&current.y_column) {
        current.y_column.clone()
    } else {
        first_numeric_column(columns, rows)
            .or_else(|| columns.get(1).cloned())
            .or_else(|| Some(columns[0].clone()))
    };

    ChartSpec {
        chart_type: current.chart_type,
        x_column,
        y_column,
    }
}
