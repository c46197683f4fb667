// File I/O for basket and master collections and the matched output

pub mod csv;
mod error;
pub mod json;
pub mod xlsx;

use std::path::Path;

use prodmatch_matcher::config::{OutputConfig, SourceConfig, DEFAULT_OUTPUT_SHEET};
use prodmatch_matcher::{Collection, CollectionKind, OutputTable};

pub use error::IoError;

/// Extensions read as delimited text.
pub const DELIMITED_EXTENSIONS: &[&str] = &["csv", "tsv", "txt"];
/// Extensions read through calamine.
pub const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];
/// Extensions `save_table` can write.
pub const OUTPUT_EXTENSIONS: &[&str] = &["xlsx", "csv", "tsv", "json"];

/// How to read one input file.
#[derive(Debug, Clone, Default)]
pub struct SourceOptions {
    /// Sheet for workbook inputs. `None` reads the first sheet.
    pub sheet: Option<String>,
    pub csv: csv::CsvOptions,
}

impl From<&SourceConfig> for SourceOptions {
    fn from(source: &SourceConfig) -> Self {
        Self {
            sheet: source.sheet.clone(),
            csv: csv::CsvOptions {
                encoding: source.encoding.clone(),
                delimiter: source.delimiter.and_then(|d| u8::try_from(d).ok()),
                text_columns: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputOptions {
    /// Sheet name for workbook output.
    pub sheet: String,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self { sheet: DEFAULT_OUTPUT_SHEET.into() }
    }
}

impl From<&OutputConfig> for OutputOptions {
    fn from(output: &OutputConfig) -> Self {
        Self { sheet: output.sheet.clone() }
    }
}

/// Lowercased file extension, empty when there is none.
pub fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Load a basket or master collection, picking the reader by extension.
pub fn load_collection(
    path: &Path,
    kind: CollectionKind,
    options: &SourceOptions,
) -> Result<Collection, IoError> {
    let ext = extension(path);
    let collection = match ext.as_str() {
        "csv" | "txt" | "tsv" => {
            if let Some(sheet) = &options.sheet {
                log::warn!("{}: ignoring sheet '{sheet}' for delimited file", path.display());
            }
            let mut csv_options = options.csv.clone();
            if ext == "tsv" {
                csv_options.delimiter.get_or_insert(b'\t');
            }
            csv::import(path, kind, &csv_options)?
        }
        e if WORKBOOK_EXTENSIONS.contains(&e) => {
            xlsx::import(path, options.sheet.as_deref(), kind)?
        }
        _ => return Err(IoError::UnsupportedFormat(ext)),
    };

    log::debug!(
        "loaded {kind} from {}: {} row(s), {} column(s)",
        path.display(),
        collection.len(),
        collection.schema().len()
    );
    Ok(collection)
}

/// Write the output table, picking the writer by extension.
pub fn save_table(path: &Path, table: &OutputTable, options: &OutputOptions) -> Result<(), IoError> {
    match extension(path).as_str() {
        "xlsx" => xlsx::export(table, path, &options.sheet)?,
        "csv" => csv::export(table, path)?,
        "tsv" => csv::export_tsv(table, path)?,
        "json" => json::export(table, path)?,
        other => return Err(IoError::UnsupportedFormat(other.to_string())),
    }
    log::debug!("wrote {} row(s) to {}", table.rows.len(), path.display());
    Ok(())
}

/// Header cell text, with blanks named the way spreadsheet tools do.
pub(crate) fn column_name(index: usize, text: Option<String>) -> String {
    match text {
        Some(t) if !t.is_empty() => t,
        _ => format!("Unnamed: {index}"),
    }
}
