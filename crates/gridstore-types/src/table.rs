//! Tabular encoding.
//!
//! A table travels as parallel arrays: a column-name sequence and a
//! per-column value-list sequence. Row order within each column is
//! preserved. Column order is whatever map iteration produces; callers
//! must not rely on it, and the decode side returns a map for the same
//! reason.

use std::collections::HashMap;

use gridstore_protocol::{EncodedValueList, Table};

use crate::codec::{decode_value_list, encode_value_list};
use crate::convert::{FromValue, ToValue};
use crate::error::ValueError;

/// Encode a column-name to value-sequence mapping as a wire table.
pub fn encode_table<T: ToValue>(
    columns: &HashMap<String, Vec<T>>,
) -> Result<Table, ValueError> {
    let mut names = Vec::with_capacity(columns.len());
    let mut values = Vec::with_capacity(columns.len());

    for (name, column) in columns {
        let list = encode_value_list(column)
            .map_err(|source| ValueError::Column {
                column: name.clone(),
                source: Box::new(source),
            })?;
        names.push(name.clone());
        values.push(list);
    }

    Ok(Table {
        columns: names,
        values,
    })
}

/// Decode a wire table into a column-name to value-sequence mapping.
///
/// Per-column decode failures are wrapped with the column name. A table
/// whose parallel arrays disagree in length is malformed.
pub fn decode_table<T: FromValue>(
    table: &Table,
) -> Result<HashMap<String, Vec<T>>, ValueError> {
    if table.columns.len() != table.values.len() {
        return Err(ValueError::Validation(format!(
            "table has {} column names but {} value columns",
            table.columns.len(),
            table.values.len()
        )));
    }

    let mut decoded = HashMap::with_capacity(table.columns.len());
    for (name, list) in table.columns.iter().zip(&table.values) {
        let column: Vec<T> = decode_value_list(list).map_err(|source| ValueError::Column {
            column: name.clone(),
            source: Box::new(source),
        })?;
        decoded.insert(name.clone(), column);
    }
    Ok(decoded)
}
