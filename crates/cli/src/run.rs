//! `prodmatch run` / `prodmatch validate`: config-driven basket matching.

use std::path::{Path, PathBuf};

use clap::Args;
use prodmatch_io::{load_collection, save_table, OutputOptions, SourceOptions};
use prodmatch_matcher::config::SourceConfig;
use prodmatch_matcher::{
    Collection, CollectionKind, MatchConfig, MatchError, MatchOutput, MatchResult, OutputTable,
    SelectionPolicy, SimilarityMetric,
};

use crate::exit_codes::{EXIT_CONFIG_INVALID, EXIT_USAGE, EXIT_WRITE};
use crate::CliError;

/// Widest cell shown by `--preview`.
const PREVIEW_CELL_WIDTH: usize = 28;

#[derive(Args)]
pub struct RunArgs {
    /// Job config (.toml). Paths inside it resolve against its directory; flags override it.
    #[arg(env = "PRODMATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Basket file (.xlsx, .csv, ...)
    #[arg(long, short = 'b')]
    pub basket: Option<PathBuf>,

    /// Basket sheet name (workbooks only; default: first sheet)
    #[arg(long)]
    pub sheet: Option<String>,

    /// Master catalog file (.csv, .xlsx, ...)
    #[arg(long, short = 'm')]
    pub master: Option<PathBuf>,

    /// Master sheet name (workbooks only; default: first sheet)
    #[arg(long)]
    pub master_sheet: Option<String>,

    /// Master text encoding for delimited files (e.g. latin-1)
    #[arg(long)]
    pub encoding: Option<String>,

    /// Minimum score (0-100) for a confident match [default: 80]
    #[arg(long, short = 't', allow_negative_numbers = true)]
    pub threshold: Option<f64>,

    /// Candidate selection (last-exceeding, highest-score)
    #[arg(long)]
    pub policy: Option<SelectionPolicy>,

    /// Edit-distance metric (indel, levenshtein)
    #[arg(long)]
    pub similarity: Option<SimilarityMetric>,

    /// Column holding the product description in both inputs
    #[arg(long)]
    pub description_column: Option<String>,

    /// Output file (.xlsx, .csv, .tsv, .json). A directory gets <name>.xlsx;
    /// a path without extension gets .xlsx appended.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Sheet name for .xlsx output
    #[arg(long)]
    pub output_sheet: Option<String>,

    /// Print the matched table as JSON to stdout
    #[arg(long)]
    pub json: bool,

    /// Print the first N output rows to stderr, with the master row and score each one took
    #[arg(long, value_name = "N")]
    pub preview: Option<usize>,

    /// Match basket rows on all cores
    #[arg(long)]
    pub parallel: bool,
}

/// A job ready to execute: validated config plus resolved file paths.
struct Job {
    config: MatchConfig,
    basket_path: PathBuf,
    master_path: PathBuf,
    output_path: Option<PathBuf>,
}

fn read_config(config_path: &Path) -> Result<MatchConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        CliError::new(EXIT_USAGE, format!("cannot read config {}: {e}", config_path.display()))
    })?;
    MatchConfig::from_toml(&config_str).map_err(|e| CliError::new(EXIT_CONFIG_INVALID, e.to_string()))
}

fn resolve_job(args: &RunArgs) -> Result<Job, CliError> {
    let (mut config, base_dir) = match &args.config {
        Some(path) => {
            let config = read_config(path)?;
            let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
            (config, base)
        }
        None => {
            let (Some(basket), Some(master)) = (&args.basket, &args.master) else {
                return Err(CliError::args("--basket and --master are required without a config file")
                    .with_hint("pass a job config, or both --basket and --master"));
            };
            let config = MatchConfig::new(
                SourceConfig::new(basket.to_string_lossy()),
                SourceConfig::new(master.to_string_lossy()),
            );
            (config, PathBuf::new())
        }
    };

    // Flag paths are relative to the working directory, config paths to the config
    let basket_path = args.basket.clone().unwrap_or_else(|| base_dir.join(&config.basket.file));
    let master_path = args.master.clone().unwrap_or_else(|| base_dir.join(&config.master.file));
    let output_path = args
        .output
        .clone()
        .or_else(|| config.output.file.as_ref().map(|f| base_dir.join(f)));

    apply_overrides(&mut config, args);
    config
        .validate()
        .map_err(|e| CliError::new(EXIT_CONFIG_INVALID, e.to_string()))?;

    let output_path = output_path.map(|p| output_file(&p, &config.name));
    if let Some(path) = &output_path {
        let ext = prodmatch_io::extension(path);
        if !prodmatch_io::OUTPUT_EXTENSIONS.contains(&ext.as_str()) {
            return Err(CliError::args(format!("cannot write output as '{}'", path.display()))
                .with_hint(format!("use one of: .{}", prodmatch_io::OUTPUT_EXTENSIONS.join(", ."))));
        }
    }
    Ok(Job { config, basket_path, master_path, output_path })
}

fn apply_overrides(config: &mut MatchConfig, args: &RunArgs) {
    if let Some(t) = args.threshold {
        config.threshold = t;
    }
    if let Some(p) = args.policy {
        config.matching.policy = p;
    }
    if let Some(s) = args.similarity {
        config.matching.similarity = s;
    }
    if let Some(c) = &args.description_column {
        config.matching.description_column = c.clone();
    }
    if args.parallel {
        config.matching.parallel = true;
    }
    if let Some(s) = &args.sheet {
        config.basket.sheet = Some(s.clone());
    }
    if let Some(s) = &args.master_sheet {
        config.master.sheet = Some(s.clone());
    }
    if let Some(e) = &args.encoding {
        config.master.encoding = Some(e.clone());
    }
    if let Some(s) = &args.output_sheet {
        config.output.sheet = s.clone();
    }
}

/// Directory → `<dir>/<name>.xlsx`; no extension → `.xlsx` appended.
fn output_file(path: &Path, job_name: &str) -> PathBuf {
    if path.is_dir() {
        let stem: String = job_name
            .trim()
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        return path.join(format!("{stem}.xlsx"));
    }
    if path.extension().is_none() {
        return path.with_extension("xlsx");
    }
    path.to_path_buf()
}

fn load(
    path: &Path,
    kind: CollectionKind,
    source: &SourceConfig,
    description_column: &str,
) -> Result<Collection, CliError> {
    let mut options = SourceOptions::from(source);
    // Descriptions score as written: "007" stays "007"
    options.csv.text_columns.push(description_column.to_string());
    load_collection(path, kind, &options).map_err(CliError::io)
}

/// Engine error with a hint naming the columns the collection does have.
fn match_error(err: MatchError, basket: &Collection, master: &Collection) -> CliError {
    let hint = match &err {
        MatchError::MissingField { collection, .. } => {
            let c = if *collection == CollectionKind::Basket { basket } else { master };
            Some(format!(
                "{collection} columns: {} (set matching.description_column or --description-column)",
                c.schema().columns().join(", ")
            ))
        }
        MatchError::InvalidFieldType { .. } => {
            Some("blank descriptions can be skipped with matching.blank_descriptions = \"unmatched\"".into())
        }
        _ => None,
    };
    let cli_err = CliError::matching(err);
    match hint {
        Some(h) => cli_err.with_hint(h),
        None => cli_err,
    }
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let job = resolve_job(&args)?;
    let config = &job.config;

    let column = &config.matching.description_column;
    let basket = load(&job.basket_path, CollectionKind::Basket, &config.basket, column)?;
    let master = load(&job.master_path, CollectionKind::Master, &config.master, column)?;

    let output = prodmatch_matcher::run(config, &basket, &master)
        .map_err(|e| match_error(e, &basket, &master))?;
    let table = output.to_table();

    if let Some(path) = &job.output_path {
        save_table(path, &table, &OutputOptions::from(&config.output)).map_err(CliError::io)?;
        eprintln!("wrote {}", path.display());
    }

    if args.json {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        prodmatch_io::json::to_writer(&table, &mut handle)
            .map_err(|e| CliError::new(EXIT_WRITE, format!("JSON serialization error: {e}")))?;
        println!();
    }

    print_summary(&output);
    if let Some(n) = args.preview {
        print_preview(&output, &table, n);
    }

    if job.output_path.is_none() && !args.json {
        eprintln!("no output file configured; pass --output or set [output] file to save the result");
    }

    Ok(())
}

/// Human summary to stderr
fn print_summary(output: &MatchOutput<'_>) {
    let s = &output.summary;
    let mean = s
        .mean_matched_score
        .map(|m| format!(", mean score {m:.1}"))
        .unwrap_or_default();
    eprintln!(
        "{}: {} of {} basket row(s) matched at threshold {} ({} exact, {} phonetic{mean}), {} unmatched",
        output.meta.name, s.matched, s.total, output.meta.threshold, s.exact_matches, s.phonetic_matches, s.unmatched,
    );
}

/// Preview cell for how a basket row fared.
fn match_note(result: &MatchResult<'_>) -> String {
    match result {
        MatchResult::Matched { master_index, score, .. } => {
            format!("master row {master_index} @ {:.1}", score.total)
        }
        MatchResult::Unmatched { best: Some(best), .. } => format!("- (best {:.1})", best.total),
        MatchResult::Unmatched { best: None, .. } => "-".to_string(),
    }
}

fn print_preview(output: &MatchOutput<'_>, table: &OutputTable, rows: usize) {
    let cell = |s: String| -> String {
        if s.chars().count() > PREVIEW_CELL_WIDTH {
            let mut t: String = s.chars().take(PREVIEW_CELL_WIDTH - 1).collect();
            t.push('…');
            t
        } else {
            s
        }
    };

    let shown: Vec<Vec<String>> = table
        .rows
        .iter()
        .take(rows)
        .zip(&output.results)
        .map(|(r, result)| {
            let mut cells: Vec<String> = r.iter().map(|v| cell(v.to_string())).collect();
            cells.push(match_note(result));
            cells
        })
        .collect();
    let mut header: Vec<String> = table.columns.iter().map(|c| cell(c.clone())).collect();
    header.push("match".to_string());

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &shown {
        for (i, v) in row.iter().enumerate() {
            widths[i] = widths[i].max(v.chars().count());
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    eprintln!("{}", line(&header));
    for row in &shown {
        eprintln!("{}", line(row));
    }
    if table.rows.len() > rows {
        eprintln!("... {} more row(s)", table.rows.len() - rows);
    }
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    eprintln!(
        "valid: {} (basket {}, master {}, threshold {}, policy {}, similarity {})",
        config.name,
        config.basket.file,
        config.master.file,
        config.threshold,
        config.matching.policy,
        config.matching.similarity,
    );
    Ok(())
}
