use crate::model::{MatchResult, MatchSummary};

/// Compute summary statistics from match results.
pub fn compute_summary(results: &[MatchResult<'_>]) -> MatchSummary {
    let mut matched = 0;
    let mut exact_matches = 0;
    let mut phonetic_matches = 0;
    let mut score_sum = 0.0;

    for r in results {
        if let MatchResult::Matched { score, .. } = r {
            matched += 1;
            score_sum += score.total;
            if score.is_exact() {
                exact_matches += 1;
            } else if score.is_phonetic_only() {
                phonetic_matches += 1;
            }
        }
    }

    MatchSummary {
        total: results.len(),
        matched,
        unmatched: results.len() - matched,
        exact_matches,
        phonetic_matches,
        mean_matched_score: (matched > 0).then(|| score_sum / matched as f64),
    }
}
