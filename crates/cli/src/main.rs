// prodmatch CLI - match basket lists against a product catalog

mod exit_codes;
mod run;
mod score;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{io_exit_code, match_exit_code, EXIT_SUCCESS, EXIT_USAGE};
use prodmatch_io::IoError;
use prodmatch_matcher::{MatchError, SimilarityMetric};

#[derive(Parser)]
#[command(name = "prodmatch")]
#[command(about = "Match basket descriptions against a master catalog (fuzzy + phonetic)")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match every basket row against the master catalog and write the merged table
    #[command(after_help = "\
Examples:
  prodmatch run weekly.toml
  prodmatch run weekly.toml --threshold 90 --output matched.xlsx
  prodmatch run --basket basket.xlsx --sheet 'Week 12' --master contracts.csv --encoding latin-1 -o out/
  prodmatch run weekly.toml --json | jq '.[0]'
  prodmatch run weekly.toml --policy highest-score --preview 10")]
    Run(run::RunArgs),

    /// Validate a job config without loading any data
    #[command(after_help = "\
Examples:
  prodmatch validate weekly.toml")]
    Validate {
        /// Path to the job config (.toml)
        config: PathBuf,
    },

    /// Score two descriptions against each other
    #[command(after_help = "\
Examples:
  prodmatch score 'Blue Pen' 'Red Pen'
  prodmatch score Smith Smyth --json
  prodmatch score 'A4 paper' 'A4 Papier' --similarity levenshtein")]
    Score {
        /// Basket-side description
        a: String,

        /// Master-side description
        b: String,

        /// Edit-distance metric (indel, levenshtein)
        #[arg(long, default_value_t = SimilarityMetric::Indel)]
        similarity: SimilarityMetric,

        /// Output JSON to stdout instead of text
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            "\nengine:  prodmatch-matcher ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            "\nengine:  prodmatch-matcher ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
        )
    }
}

/// Route `log` records from the library crates to stderr.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // A second init (tests driving main twice) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => run::cmd_run(args),
        Commands::Validate { config } => run::cmd_validate(config),
        Commands::Score { a, b, similarity, json } => score::cmd_score(&a, &b, similarity, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    /// Create error from an IoError with its registry exit code and a hint where one helps.
    pub fn io(err: IoError) -> Self {
        let hint = match &err {
            IoError::SheetNotFound { available, .. } if !available.is_empty() => {
                Some(format!("available sheets: {}", available.join(", ")))
            }
            IoError::UnsupportedFormat(_) => Some(format!(
                "inputs may be .{} or .{}",
                prodmatch_io::DELIMITED_EXTENSIONS.join(", ."),
                prodmatch_io::WORKBOOK_EXTENSIONS.join(", ."),
            )),
            IoError::Decode { .. } | IoError::UnknownEncoding(_) => {
                Some("pass --encoding (e.g. latin-1, windows-1252, utf-8)".to_string())
            }
            _ => None,
        };
        Self { code: io_exit_code(&err), message: err.to_string(), hint }
    }

    pub fn matching(err: MatchError) -> Self {
        Self::new(match_exit_code(&err), err.to_string())
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
