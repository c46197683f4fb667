use std::fmt;

use crate::model::CollectionKind;

#[derive(Debug, Clone, PartialEq)]
pub enum MatchError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty name, bad threshold, etc.).
    ConfigValidation(String),
    /// A record has no value for the description column.
    MissingField {
        collection: CollectionKind,
        row: usize,
        column: String,
    },
    /// The description value is present but cannot be read as text.
    InvalidFieldType {
        collection: CollectionKind,
        row: usize,
        column: String,
    },
    /// Two columns of one collection share a name.
    DuplicateColumn {
        collection: CollectionKind,
        column: String,
    },
    /// Threshold is NaN or infinite.
    InvalidThreshold(f64),
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingField { collection, row, column } => {
                write!(f, "{collection} row {row}: missing field '{column}'")
            }
            Self::InvalidFieldType { collection, row, column } => {
                write!(f, "{collection} row {row}: field '{column}' is not text")
            }
            Self::DuplicateColumn { collection, column } => {
                write!(f, "{collection}: duplicate column '{column}'")
            }
            Self::InvalidThreshold(t) => write!(f, "threshold must be a finite number, got {t}"),
        }
    }
}

impl std::error::Error for MatchError {}
