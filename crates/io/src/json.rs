// JSON export

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use prodmatch_matcher::{OutputTable, Value};
use serde_json::{Map, Number, Value as JsonValue};

/// Largest magnitude an f64 holds without losing integer precision.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Output rows as JSON objects keyed by column name, in column order.
/// Missing cells are `null`.
pub fn records(table: &OutputTable) -> Vec<Map<String, JsonValue>> {
    table
        .rows
        .iter()
        .map(|row| {
            table
                .columns
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), row.get(i).map(json_value).unwrap_or(JsonValue::Null)))
                .collect()
        })
        .collect()
}

fn json_value(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Text(s) => JsonValue::String(s.clone()),
        // Whole numbers print without a fraction, as in the source sheet
        Value::Number(n) if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER => JsonValue::from(*n as i64),
        // NaN and infinities have no JSON form
        Value::Number(n) => Number::from_f64(*n).map(JsonValue::Number).unwrap_or(JsonValue::Null),
    }
}

/// Pretty-print the table as a JSON array of objects.
pub fn to_writer<W: Write>(table: &OutputTable, writer: W) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(writer, &records(table))
}

pub fn export(table: &OutputTable, path: &Path) -> Result<(), crate::IoError> {
    let file = File::create(path).map_err(|e| crate::IoError::write(path, e))?;
    let mut writer = BufWriter::new(file);

    to_writer(table, &mut writer).map_err(|e| crate::IoError::write(path, e))?;
    writer.flush().map_err(|e| crate::IoError::write(path, e))?;

    Ok(())
}
