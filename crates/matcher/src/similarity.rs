//! Edit-distance similarity ratios on a 0–100 scale.
//!
//! Both metrics are symmetric, return 100 for identical strings and fall as
//! their edit distance grows. Lengths are counted in Unicode scalar values.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// `100 * (1 - indel / (len_a + len_b))`, insertions and deletions only.
    #[default]
    Indel,
    /// `100 * (1 - levenshtein / max_len)`.
    Levenshtein,
}

impl SimilarityMetric {
    pub fn ratio(&self, a: &str, b: &str) -> f64 {
        match self {
            Self::Indel => indel_ratio(a, b),
            Self::Levenshtein => strsim::normalized_levenshtein(a, b) * 100.0,
        }
    }
}

impl std::fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Indel => write!(f, "indel"),
            Self::Levenshtein => write!(f, "levenshtein"),
        }
    }
}

impl std::str::FromStr for SimilarityMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "indel" | "ratio" => Ok(Self::Indel),
            "levenshtein" | "lev" => Ok(Self::Levenshtein),
            _ => Err(format!("unknown similarity: {s} (expected indel or levenshtein)")),
        }
    }
}

/// Classic string-similarity ratio from the insert/delete distance.
pub fn indel_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    let distance = total - 2 * lcs_len(&a, &b);
    100.0 * (1.0 - distance as f64 / total as f64)
}

/// Longest common subsequence length, two-row table.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
