//! `prodmatch score`: explain how two descriptions score against each other.

use prodmatch_matcher::phonetic::metaphone;
use prodmatch_matcher::score::Scorer;
use prodmatch_matcher::SimilarityMetric;

use crate::exit_codes::EXIT_WRITE;
use crate::CliError;

pub fn cmd_score(a: &str, b: &str, metric: SimilarityMetric, json: bool) -> Result<(), CliError> {
    let score = Scorer::new(metric).score_pair(a, b);
    let (key_a, key_b) = (metaphone(a), metaphone(b));

    if json {
        let out = serde_json::json!({
            "a": a,
            "b": b,
            "similarity_metric": metric.to_string(),
            "similarity": score.similarity,
            "phonetic_keys": [key_a, key_b],
            "phonetic": score.phonetic,
            "score": score.total,
        });
        let text = serde_json::to_string_pretty(&out)
            .map_err(|e| CliError::new(EXIT_WRITE, format!("JSON serialization error: {e}")))?;
        println!("{text}");
        return Ok(());
    }

    println!("similarity: {:>6.2}  ({metric})", score.similarity);
    println!("phonetic:   {:>6.2}  ({key_a:?} / {key_b:?})", score.phonetic);
    println!("score:      {:>6.2}", score.total);
    Ok(())
}
