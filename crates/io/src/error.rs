use std::fmt;
use std::path::{Path, PathBuf};

use prodmatch_matcher::MatchError;

#[derive(Debug)]
pub enum IoError {
    /// File could not be opened (missing, permissions, not a workbook).
    Open { path: PathBuf, message: String },
    /// File opened but its contents could not be read or parsed.
    Read { path: PathBuf, message: String },
    /// Bytes are not valid in the requested encoding.
    Decode { path: PathBuf, encoding: String },
    UnknownEncoding(String),
    /// Extension is not one we know how to read or write.
    UnsupportedFormat(String),
    SheetNotFound { sheet: String, available: Vec<String> },
    /// No header row could be found.
    EmptySheet { path: PathBuf },
    /// Loaded table cannot form a collection (duplicate column names).
    Schema(MatchError),
    Write { path: PathBuf, message: String },
}

impl IoError {
    pub(crate) fn open(path: &Path, e: impl fmt::Display) -> Self {
        Self::Open { path: path.to_path_buf(), message: e.to_string() }
    }

    pub(crate) fn read(path: &Path, e: impl fmt::Display) -> Self {
        Self::Read { path: path.to_path_buf(), message: e.to_string() }
    }

    pub(crate) fn write(path: &Path, e: impl fmt::Display) -> Self {
        Self::Write { path: path.to_path_buf(), message: e.to_string() }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, message } => {
                write!(f, "cannot open {}: {message}", path.display())
            }
            Self::Read { path, message } => {
                write!(f, "cannot read {}: {message}", path.display())
            }
            Self::Decode { path, encoding } => {
                write!(f, "{} is not valid {encoding}", path.display())
            }
            Self::UnknownEncoding(label) => write!(f, "unknown encoding '{label}'"),
            Self::UnsupportedFormat(ext) => {
                if ext.is_empty() {
                    write!(f, "file has no extension")
                } else {
                    write!(f, "unsupported file format '.{ext}'")
                }
            }
            Self::SheetNotFound { sheet, available } => {
                write!(f, "sheet '{sheet}' not found (available: {})", available.join(", "))
            }
            Self::EmptySheet { path } => write!(f, "{} has no header row", path.display()),
            Self::Schema(e) => write!(f, "{e}"),
            Self::Write { path, message } => {
                write!(f, "cannot write {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Schema(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MatchError> for IoError {
    fn from(e: MatchError) -> Self {
        Self::Schema(e)
    }
}
