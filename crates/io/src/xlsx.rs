// Excel import/export

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use prodmatch_matcher::{Collection, CollectionKind, OutputTable, Value};
use rust_xlsxwriter::{Format, Workbook};

use crate::{column_name, IoError};

/// Import one sheet of a workbook (xlsx, xlsm, xls, xlsb, ods).
///
/// `sheet = None` reads the first sheet. The first row with any content is
/// the header; rows after it are records, minus trailing blank rows.
pub fn import(path: &Path, sheet: Option<&str>, kind: CollectionKind) -> Result<Collection, IoError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| IoError::open(path, e))?;
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();

    let name = match sheet {
        Some(wanted) => sheet_names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| IoError::SheetNotFound {
                sheet: wanted.to_string(),
                available: sheet_names.clone(),
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| IoError::EmptySheet { path: path.to_path_buf() })?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| IoError::read(path, format!("sheet '{name}': {e}")))?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_value).collect::<Vec<Value>>());

    let header = rows
        .by_ref()
        .find(|r| r.iter().any(|v| !v.is_null()))
        .ok_or_else(|| IoError::EmptySheet { path: path.to_path_buf() })?;
    let columns = header
        .iter()
        .enumerate()
        .map(|(i, v)| column_name(i, v.as_text().map(|t| t.into_owned())))
        .collect();

    let mut data: Vec<Vec<Value>> = rows.collect();
    while data.last().is_some_and(|r| r.iter().all(Value::is_null)) {
        data.pop();
    }

    log::debug!("{}: read sheet '{name}' ({} data row(s))", path.display(), data.len());
    Ok(Collection::from_rows(kind, columns, data)?)
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) if s.is_empty() => Value::Null,
        Data::String(s) => Value::Text(s.clone()),
        Data::Float(n) => Value::Number(*n),
        Data::Int(n) => Value::Number(*n as f64),
        Data::Bool(b) => Value::from(if *b { "TRUE" } else { "FALSE" }),
        Data::Error(e) => Value::Text(e.to_string()),
        // Serial date number, 1900 system
        Data::DateTime(dt) => Value::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::Text(s.clone()),
    }
}

/// Write the output table as a single-sheet workbook with a bold, frozen header row.
pub fn export(table: &OutputTable, path: &Path, sheet_name: &str) -> Result<(), IoError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let worksheet = workbook
        .add_worksheet()
        .set_name(sheet_name)
        .map_err(|e| IoError::write(path, format!("sheet '{sheet_name}': {e}")))?;

    for (col, name) in table.columns.iter().enumerate() {
        let (row32, col16) = cell_ref(path, 0, col)?;
        worksheet
            .write_string_with_format(row32, col16, name, &header)
            .map_err(|e| IoError::write(path, e))?;
    }

    for (row, values) in table.rows.iter().enumerate() {
        for (col, value) in values.iter().enumerate() {
            let (row32, col16) = cell_ref(path, row + 1, col)?;
            match value {
                Value::Null => {}
                Value::Text(s) => {
                    worksheet
                        .write_string(row32, col16, s)
                        .map_err(|e| IoError::write(path, e))?;
                }
                Value::Number(n) => {
                    worksheet
                        .write_number(row32, col16, *n)
                        .map_err(|e| IoError::write(path, e))?;
                }
            }
        }
    }

    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|e| IoError::write(path, e))?;
    worksheet.autofit();

    workbook.save(path).map_err(|e| IoError::write(path, e))?;
    Ok(())
}

fn cell_ref(path: &Path, row: usize, col: usize) -> Result<(u32, u16), IoError> {
    match (u32::try_from(row), u16::try_from(col)) {
        (Ok(r), Ok(c)) => Ok((r, c)),
        _ => Err(IoError::write(path, format!("cell ({row}, {col}) is outside the sheet"))),
    }
}
