//! Outcome and treatment column resolution
//!
//! Both the outcome and the treatment indicator must be binary 0/1. Columns
//! that use other codes (e.g. "yes"/"no") can be mapped with a
//! [`TargetMapping`]; values matching neither side become `None` and the
//! record is excluded from the analysis.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::{InfoError, InfoResult};

/// Tolerance for floating point comparison when checking binary 0/1 values
const TOLERANCE: f64 = 1e-9;

/// Distinct values listed in a `NonBinaryColumn` error
const MAX_REPORTED_VALUES: usize = 10;

/// Mapping configuration for converting column values to binary 0/1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetMapping {
    /// Value that maps to 1 (event / treatment)
    pub event_value: String,
    /// Value that maps to 0 (non-event / control)
    pub non_event_value: String,
}

impl TargetMapping {
    /// Create a new target mapping
    pub fn new(event_value: impl Into<String>, non_event_value: impl Into<String>) -> Self {
        Self {
            event_value: event_value.into(),
            non_event_value: non_event_value.into(),
        }
    }
}

/// Read a binary column as `Some(1)`, `Some(0)` or `None` (null / unmapped).
///
/// # Arguments
/// * `df` - Dataset holding the column
/// * `column` - Column name
/// * `mapping` - Optional mapping for columns that are not already 0/1
///
/// # Errors
/// * `ColumnNotFound` if the column does not exist
/// * `NonBinaryColumn` if the column is not 0/1 and no mapping was given
pub fn binary_column(
    df: &DataFrame,
    column: &str,
    mapping: Option<&TargetMapping>,
) -> InfoResult<Vec<Option<u8>>> {
    let col = df
        .column(column)
        .map_err(|_| InfoError::ColumnNotFound(column.to_string()))?;

    if let Some(mapping) = mapping {
        let mask = column_to_string_vec(col)?
            .into_iter()
            .map(|v| match v {
                Some(s) if s == mapping.event_value => Some(1),
                Some(s) if s == mapping.non_event_value => Some(0),
                _ => None,
            })
            .collect();
        return Ok(mask);
    }

    if matches!(col.dtype(), DataType::Boolean) {
        return Ok(col.bool()?.into_iter().map(|v| v.map(u8::from)).collect());
    }

    if !col.dtype().is_primitive_numeric() {
        return Err(non_binary(column, col)?);
    }

    let float_col = col.cast(&DataType::Float64)?;
    let mut values = Vec::with_capacity(col.len());
    for v in float_col.f64()?.into_iter() {
        match v {
            None => values.push(None),
            Some(x) if x.abs() < TOLERANCE => values.push(Some(0)),
            Some(x) if (x - 1.0).abs() < TOLERANCE => values.push(Some(1)),
            Some(_) => return Err(non_binary(column, col)?),
        }
    }
    Ok(values)
}

fn non_binary(column: &str, col: &Column) -> InfoResult<InfoError> {
    let mut found: Vec<String> = column_to_string_vec(&col.unique()?)?
        .into_iter()
        .flatten()
        .collect();
    found.sort();
    found.truncate(MAX_REPORTED_VALUES);
    Ok(InfoError::NonBinaryColumn {
        column: column.to_string(),
        found,
    })
}

/// Convert a column to a Vec of Option<String> for comparison
fn column_to_string_vec(col: &Column) -> InfoResult<Vec<Option<String>>> {
    let values: Vec<Option<String>> = match col.dtype() {
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
            let cast = col.cast(&DataType::Int64)?;
            cast.i64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
            let cast = col.cast(&DataType::UInt64)?;
            cast.u64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::Float32 | DataType::Float64 => {
            let cast = col.cast(&DataType::Float64)?;
            cast.f64()?
                .into_iter()
                .map(|v| v.map(|n| format!("{}", n)))
                .collect()
        }
        _ => {
            let cast = col.cast(&DataType::String)?;
            cast.str()?
                .into_iter()
                .map(|v| v.map(|s| s.to_string()))
                .collect()
        }
    };
    Ok(values)
}
