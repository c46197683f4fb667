use rayon::prelude::*;

use crate::config::{BlankDescriptions, MatchConfig, DEFAULT_DESCRIPTION_COLUMN};
use crate::error::MatchError;
use crate::matcher::{select_candidate, SelectionPolicy};
use crate::model::{Collection, MatchMeta, MatchOutput, MatchResult, Value};
use crate::score::{Description, Scorer};
use crate::similarity::SimilarityMetric;
use crate::summary::compute_summary;

/// Knobs for a single matching run.
#[derive(Debug, Clone)]
pub struct MatchOptions {
    pub name: String,
    pub threshold: f64,
    pub policy: SelectionPolicy,
    pub similarity: SimilarityMetric,
    pub description_column: String,
    pub blank_descriptions: BlankDescriptions,
    /// Spread basket rows over the rayon pool. Output order is unchanged.
    pub parallel: bool,
}

impl MatchOptions {
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            name: "product match".into(),
            threshold,
            policy: SelectionPolicy::default(),
            similarity: SimilarityMetric::default(),
            description_column: DEFAULT_DESCRIPTION_COLUMN.into(),
            blank_descriptions: BlankDescriptions::default(),
            parallel: false,
        }
    }
}

impl From<&MatchConfig> for MatchOptions {
    fn from(config: &MatchConfig) -> Self {
        Self {
            name: config.name.clone(),
            threshold: config.threshold,
            policy: config.matching.policy,
            similarity: config.matching.similarity,
            description_column: config.matching.description_column.clone(),
            blank_descriptions: config.matching.blank_descriptions,
            parallel: config.matching.parallel,
        }
    }
}

/// Run matching per config. Returns one result per basket row + summary.
pub fn run<'a>(
    config: &MatchConfig,
    basket: &'a Collection,
    master: &'a Collection,
) -> Result<MatchOutput<'a>, MatchError> {
    match_collections(basket, master, &MatchOptions::from(config))
}

/// Match every basket record against the full master collection.
///
/// Results come back in basket order. Any missing or unreadable description
/// aborts the whole run.
pub fn match_collections<'a>(
    basket: &'a Collection,
    master: &'a Collection,
    options: &MatchOptions,
) -> Result<MatchOutput<'a>, MatchError> {
    if !options.threshold.is_finite() {
        return Err(MatchError::InvalidThreshold(options.threshold));
    }

    let scorer = Scorer::new(options.similarity);

    // Master keys are computed once for the whole run.
    let master_descriptions: Vec<Option<Description<'a>>> = (0..master.len())
        .map(|row| description(master, row, options))
        .collect::<Result<_, _>>()?;

    log::debug!(
        "matching {} basket row(s) against {} master row(s), threshold {}, policy {}",
        basket.len(),
        master.len(),
        options.threshold,
        options.policy,
    );

    let match_row = |row: usize| -> Result<MatchResult<'a>, MatchError> {
        let record = basket
            .record(row)
            .ok_or_else(|| missing(basket, row, options))?;

        let Some(desc) = description(basket, row, options)? else {
            return Ok(MatchResult::Unmatched { basket: record, best: None });
        };

        let candidates = master_descriptions
            .iter()
            .enumerate()
            .filter_map(|(i, m)| m.as_ref().map(|m| (i, scorer.candidate_score(&desc, m))));

        let selection = select_candidate(candidates, options.threshold, options.policy);

        Ok(match selection.accepted(options.threshold) {
            Some((master_index, score)) => MatchResult::Matched {
                basket: record,
                master: master
                    .record(master_index)
                    .ok_or_else(|| missing(master, master_index, options))?,
                master_index,
                score,
            },
            None => MatchResult::Unmatched {
                basket: record,
                best: selection.best_seen,
            },
        })
    };

    let results: Vec<MatchResult<'a>> = if options.parallel {
        // Gather every row before short-circuiting so the error reported is
        // the first failing row, as in the sequential scan.
        (0..basket.len())
            .into_par_iter()
            .map(match_row)
            .collect::<Vec<_>>()
            .into_iter()
            .collect::<Result<_, _>>()?
    } else {
        (0..basket.len()).map(match_row).collect::<Result<_, _>>()?
    };

    let summary = compute_summary(&results);
    log::debug!("{} of {} basket row(s) matched", summary.matched, summary.total);

    Ok(MatchOutput {
        meta: MatchMeta {
            name: options.name.clone(),
            threshold: options.threshold,
            policy: options.policy,
            similarity: options.similarity,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        results,
    })
}

fn missing(collection: &Collection, row: usize, options: &MatchOptions) -> MatchError {
    MatchError::MissingField {
        collection: collection.kind(),
        row,
        column: options.description_column.clone(),
    }
}

/// Description of one row, `None` for a tolerated blank cell.
fn description<'a>(
    collection: &'a Collection,
    row: usize,
    options: &MatchOptions,
) -> Result<Option<Description<'a>>, MatchError> {
    let value = collection
        .record(row)
        .and_then(|r| r.get(&options.description_column))
        .ok_or_else(|| missing(collection, row, options))?;

    match value {
        Value::Null => match options.blank_descriptions {
            BlankDescriptions::Unmatched => Ok(None),
            BlankDescriptions::Error => Err(MatchError::InvalidFieldType {
                collection: collection.kind(),
                row,
                column: options.description_column.clone(),
            }),
        },
        other => Ok(other.as_text().map(Description::new)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CollectionKind;

    fn basket(descs: &[&str]) -> Collection {
        Collection::from_rows(
            CollectionKind::Basket,
            vec!["Product Description".into()],
            descs.iter().map(|d| vec![Value::from(*d)]).collect(),
        )
        .unwrap()
    }

    fn master(rows: &[(&str, f64)]) -> Collection {
        Collection::from_rows(
            CollectionKind::Master,
            vec!["Product Description".into(), "Price".into()],
            rows.iter()
                .map(|(d, p)| vec![Value::from(*d), Value::Number(*p)])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn blue_pen_scenario() {
        let b = basket(&["Blue Pen"]);
        let m = master(&[("Blue Pen", 1.50), ("Red Pen", 1.20)]);
        let out = match_collections(&b, &m, &MatchOptions::with_threshold(80.0)).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out.results[0].master_index(), Some(0));
        let table = out.to_table();
        assert_eq!(table.columns, vec!["Product Description", "Price"]);
        assert_eq!(table.rows, vec![vec![Value::from("Blue Pen"), Value::Number(1.5)]]);
    }

    #[test]
    fn unrelated_at_99_is_unchanged() {
        let b = basket(&["Stapler"]);
        let m = master(&[("Blue Pen", 1.50), ("Red Pen", 1.20)]);
        let out = match_collections(&b, &m, &MatchOptions::with_threshold(99.0)).unwrap();
        assert!(!out.results[0].is_matched());
        assert_eq!(out.to_table().columns, vec!["Product Description"]);
    }

    #[test]
    fn phonetic_match_clears_high_threshold() {
        let b = basket(&["Smith"]);
        let m = master(&[("Smyth", 4.0)]);
        let out = match_collections(&b, &m, &MatchOptions::with_threshold(95.0)).unwrap();
        assert_eq!(out.results[0].score(), Some(100.0));
        assert_eq!(out.summary.phonetic_matches, 1);
    }

    #[test]
    fn number_description_is_coerced() {
        let b = Collection::from_rows(
            CollectionKind::Basket,
            vec!["Product Description".into()],
            vec![vec![Value::Number(4711.0)]],
        )
        .unwrap();
        let m = master(&[("4711", 2.0)]);
        let out = match_collections(&b, &m, &MatchOptions::with_threshold(90.0)).unwrap();
        assert!(out.results[0].is_matched());
    }

    #[test]
    fn missing_column_reports_first_row() {
        let b = basket(&["Blue Pen"]);
        let m = Collection::from_rows(
            CollectionKind::Master,
            vec!["Description".into()],
            vec![vec!["Blue Pen".into()]],
        )
        .unwrap();
        let err = match_collections(&b, &m, &MatchOptions::with_threshold(80.0)).unwrap_err();
        assert_eq!(
            err,
            MatchError::MissingField {
                collection: CollectionKind::Master,
                row: 0,
                column: "Product Description".into()
            }
        );
    }

    #[test]
    fn ragged_row_reports_its_position() {
        let b = Collection::from_rows(
            CollectionKind::Basket,
            vec!["Qty".into(), "Product Description".into()],
            vec![vec![1.0.into(), "Pen".into()], vec![2.0.into()]],
        )
        .unwrap();
        let m = master(&[("Pen", 1.0)]);
        let err = match_collections(&b, &m, &MatchOptions::with_threshold(80.0)).unwrap_err();
        assert!(matches!(err, MatchError::MissingField { collection: CollectionKind::Basket, row: 1, .. }));
    }

    #[test]
    fn blank_description_errors_by_default() {
        let b = Collection::from_rows(
            CollectionKind::Basket,
            vec!["Product Description".into()],
            vec![vec![Value::Null]],
        )
        .unwrap();
        let m = master(&[("Pen", 1.0)]);
        let err = match_collections(&b, &m, &MatchOptions::with_threshold(80.0)).unwrap_err();
        assert!(matches!(err, MatchError::InvalidFieldType { row: 0, .. }));
    }

    #[test]
    fn blank_descriptions_tolerated_when_configured() {
        let b = Collection::from_rows(
            CollectionKind::Basket,
            vec!["Product Description".into()],
            vec![vec![Value::Null], vec!["Pen".into()]],
        )
        .unwrap();
        let m = Collection::from_rows(
            CollectionKind::Master,
            vec!["Product Description".into(), "Price".into()],
            vec![vec!["Pen".into(), 1.0.into()], vec![Value::Null, 9.0.into()]],
        )
        .unwrap();
        let mut options = MatchOptions::with_threshold(-1.0);
        options.blank_descriptions = BlankDescriptions::Unmatched;

        let out = match_collections(&b, &m, &options).unwrap();
        assert!(!out.results[0].is_matched());
        // The blank master row is never offered, even below every score.
        assert_eq!(out.results[1].master_index(), Some(0));
    }

    #[test]
    fn parallel_reports_first_failing_row() {
        let mut rows = vec![vec![Value::from("Pen")]; 64];
        for row in [5, 17, 40, 63] {
            rows[row] = vec![Value::Null];
        }
        let b = Collection::from_rows(CollectionKind::Basket, vec!["Product Description".into()], rows).unwrap();
        let m = master(&[("Pen", 1.0)]);
        let mut options = MatchOptions::with_threshold(80.0);
        options.parallel = true;

        for _ in 0..8 {
            let err = match_collections(&b, &m, &options).unwrap_err();
            assert!(matches!(err, MatchError::InvalidFieldType { row: 5, .. }), "{err:?}");
        }
    }

    #[test]
    fn non_finite_threshold_rejected() {
        let b = basket(&["Pen"]);
        let m = master(&[("Pen", 1.0)]);
        let err = match_collections(&b, &m, &MatchOptions::with_threshold(f64::INFINITY)).unwrap_err();
        assert!(matches!(err, MatchError::InvalidThreshold(_)));
    }

    #[test]
    fn highest_score_policy_picks_true_best() {
        let b = basket(&["Blue Pen"]);
        let m = master(&[("Blue Pen", 1.50), ("Blue Pens", 1.60)]);
        let mut options = MatchOptions::with_threshold(50.0);

        let last = match_collections(&b, &m, &options).unwrap();
        assert_eq!(last.results[0].master_index(), Some(1));

        options.policy = SelectionPolicy::HighestScore;
        let best = match_collections(&b, &m, &options).unwrap();
        assert_eq!(best.results[0].master_index(), Some(0));
    }

    #[test]
    fn run_uses_config() {
        let config = MatchConfig::from_toml(
            r#"
name = "cfg"
threshold = 99
[basket]
file = "b.csv"
[master]
file = "m.csv"
"#,
        )
        .unwrap();
        let b = basket(&["Blue Pen"]);
        let m = master(&[("Blue Pen", 1.50)]);
        let out = run(&config, &b, &m).unwrap();
        assert_eq!(out.meta.name, "cfg");
        assert_eq!(out.meta.threshold, 99.0);
        assert_eq!(out.summary.matched, 1);
    }
}
