//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success                                                   |
//! | 2    | CLI usage error (bad args, unreadable config file)        |
//! | 3    | Job config is invalid (parse or validation)               |
//! | 4    | Input could not be read (missing file, sheet, encoding)   |
//! | 5    | Matching failed (missing or blank description, bad data)  |
//! | 6    | Output could not be written                               |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant with the next free number
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Map it in `io_exit_code` / `match_exit_code` if an error type produces it

use prodmatch_io::IoError;
use prodmatch_matcher::MatchError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing required options.
/// clap exits with the same code for its own parse errors.
pub const EXIT_USAGE: u8 = 2;

/// Job config failed to parse or validate.
pub const EXIT_CONFIG_INVALID: u8 = 3;

/// Basket or master could not be loaded.
pub const EXIT_INPUT: u8 = 4;

/// Engine rejected the loaded data.
pub const EXIT_MATCH: u8 = 5;

/// Writing the output file failed.
pub const EXIT_WRITE: u8 = 6;

/// Map an IoError to its exit code.
pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Write { .. } => EXIT_WRITE,
        // Duplicate headers surface while loading, but they are a data problem
        IoError::Schema(_) => EXIT_MATCH,
        IoError::Open { .. }
        | IoError::Read { .. }
        | IoError::Decode { .. }
        | IoError::UnknownEncoding(_)
        | IoError::UnsupportedFormat(_)
        | IoError::SheetNotFound { .. }
        | IoError::EmptySheet { .. } => EXIT_INPUT,
    }
}

/// Map a MatchError to its exit code.
pub fn match_exit_code(err: &MatchError) -> u8 {
    match err {
        MatchError::ConfigParse(_) | MatchError::ConfigValidation(_) | MatchError::InvalidThreshold(_) => {
            EXIT_CONFIG_INVALID
        }
        MatchError::MissingField { .. }
        | MatchError::InvalidFieldType { .. }
        | MatchError::DuplicateColumn { .. } => EXIT_MATCH,
    }
}
