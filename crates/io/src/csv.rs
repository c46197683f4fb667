// CSV/TSV import/export

use std::path::Path;

use encoding_rs::Encoding;
use prodmatch_matcher::{Collection, CollectionKind, OutputTable, Value};

use crate::{column_name, IoError};

#[derive(Debug, Clone, Default)]
pub struct CsvOptions {
    /// Encoding label understood by `encoding_rs` ("latin-1", "utf-8", ...).
    /// `None` reads UTF-8 and falls back to Windows-1252.
    pub encoding: Option<String>,
    /// Field delimiter. Sniffed from the first lines when `None`.
    pub delimiter: Option<u8>,
    /// Columns read as text even when every field looks numeric.
    pub text_columns: Vec<String>,
}

/// Read a delimited file. The first record is the header.
///
/// Empty fields become `Null`. A column whose non-empty fields all parse as
/// numbers is read as numbers, unless it is listed in `text_columns`.
pub fn import(path: &Path, kind: CollectionKind, options: &CsvOptions) -> Result<Collection, IoError> {
    let content = match &options.encoding {
        Some(label) => read_file_with_encoding(path, label)?,
        None => read_file_as_utf8(path)?,
    };
    let delimiter = options.delimiter.unwrap_or_else(|| sniff_delimiter(&content));
    import_from_string(path, &content, delimiter, kind, &options.text_columns)
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| field_count(line, delim))
            .collect();

        // A single-field header says nothing about this candidate
        let target = counts.first().copied().unwrap_or(0);
        if target <= 1 {
            continue;
        }

        // Lines agreeing with the header width, weighted by that width
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

fn field_count(line: &str, delimiter: u8) -> usize {
    ::csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(|r| r.ok())
        .map(|r| r.len())
        .unwrap_or(1)
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let bytes = std::fs::read(path).map_err(|e| IoError::open(path, e))?;

    // Try UTF-8 first; on failure, recover the buffer from the error
    match String::from_utf8(bytes) {
        Ok(s) => Ok(strip_bom(s)),
        Err(e) => {
            log::warn!("{} is not UTF-8, decoding as Windows-1252", path.display());
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

/// Read file in an explicitly named encoding. Malformed input is an error.
pub fn read_file_with_encoding(path: &Path, label: &str) -> Result<String, IoError> {
    let encoding = lookup_encoding(label)?;
    let bytes = std::fs::read(path).map_err(|e| IoError::open(path, e))?;

    let (decoded, had_errors) = encoding.decode_with_bom_removal(&bytes);
    if had_errors {
        return Err(IoError::Decode {
            path: path.to_path_buf(),
            encoding: encoding.name().to_string(),
        });
    }
    Ok(decoded.into_owned())
}

/// Resolve an encoding label. Accepts WHATWG labels plus the hyphenated
/// spellings common elsewhere ("latin-1", "utf_8").
pub fn lookup_encoding(label: &str) -> Result<&'static Encoding, IoError> {
    let trimmed = label.trim();
    Encoding::for_label(trimmed.as_bytes())
        .or_else(|| {
            let squashed: String = trimmed.chars().filter(|c| *c != '-' && *c != '_').collect();
            Encoding::for_label(squashed.as_bytes())
        })
        .ok_or_else(|| IoError::UnknownEncoding(label.to_string()))
}

fn strip_bom(s: String) -> String {
    match s.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => s,
    }
}

fn import_from_string(
    path: &Path,
    content: &str,
    delimiter: u8,
    kind: CollectionKind,
    text_columns: &[String],
) -> Result<Collection, IoError> {
    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());
    let mut records = reader.records();

    let header = match records.next() {
        Some(r) => r.map_err(|e| IoError::read(path, e))?,
        None => return Err(IoError::EmptySheet { path: path.to_path_buf() }),
    };
    let columns: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, name)| column_name(i, Some(name.to_string())))
        .collect();

    let rows = records
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| IoError::read(path, e))?;

    // Columns are typed as a whole: one stray word keeps the column text
    let numeric: Vec<bool> = columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            !text_columns.contains(name)
                && rows
                    .iter()
                    .filter_map(|r| r.get(i))
                    .filter(|f| !f.is_empty())
                    .all(|f| parse_number(f).is_some())
        })
        .collect();

    let mut collection = Collection::new(kind, columns)?;
    for record in &rows {
        collection.push_row(
            record
                .iter()
                .enumerate()
                .map(|(i, field)| {
                    if field.is_empty() {
                        return Value::Null;
                    }
                    match parse_number(field) {
                        Some(n) if numeric.get(i).copied().unwrap_or(false) => Value::Number(n),
                        _ => Value::from(field),
                    }
                })
                .collect(),
        );
    }

    Ok(collection)
}

/// Decimal number with a `.` separator. "inf", "NaN" and overflow stay text.
fn parse_number(field: &str) -> Option<f64> {
    let trimmed = field.trim();
    if !trimmed.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

pub fn export(table: &OutputTable, path: &Path) -> Result<(), IoError> {
    export_with_delimiter(table, path, b',')
}

pub fn export_tsv(table: &OutputTable, path: &Path) -> Result<(), IoError> {
    export_with_delimiter(table, path, b'\t')
}

fn export_with_delimiter(table: &OutputTable, path: &Path, delimiter: u8) -> Result<(), IoError> {
    let mut writer = ::csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .map_err(|e| IoError::write(path, e))?;

    writer.write_record(&table.columns).map_err(|e| IoError::write(path, e))?;
    for row in &table.rows {
        // Null writes as an empty field
        writer
            .write_record(row.iter().map(|v| v.to_string()))
            .map_err(|e| IoError::write(path, e))?;
    }

    writer.flush().map_err(|e| IoError::write(path, e))?;
    Ok(())
}
