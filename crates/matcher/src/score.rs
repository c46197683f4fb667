use std::borrow::Cow;

use serde::Serialize;

use crate::phonetic::metaphone;
use crate::similarity::SimilarityMetric;

pub const PHONETIC_MATCH: f64 = 100.0;

/// Scores for one basket/master description pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CandidateScore {
    pub similarity: f64,
    /// 100 when both phonetic keys are equal, else 0.
    pub phonetic: f64,
    /// `max(similarity, phonetic)`
    pub total: f64,
}

impl CandidateScore {
    pub fn is_exact(&self) -> bool {
        self.similarity >= 100.0
    }

    pub fn is_phonetic_only(&self) -> bool {
        self.phonetic >= PHONETIC_MATCH && self.similarity < 100.0
    }
}

/// A description with its phonetic key computed once.
#[derive(Debug, Clone)]
pub struct Description<'a> {
    text: Cow<'a, str>,
    key: String,
}

impl<'a> Description<'a> {
    pub fn new(text: impl Into<Cow<'a, str>>) -> Self {
        let text = text.into();
        let key = metaphone(&text);
        Self { text, key }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Scorer {
    metric: SimilarityMetric,
}

impl Scorer {
    pub fn new(metric: SimilarityMetric) -> Self {
        Self { metric }
    }

    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    pub fn candidate_score(&self, basket: &Description<'_>, master: &Description<'_>) -> CandidateScore {
        let similarity = self.metric.ratio(basket.text(), master.text());
        let phonetic = if basket.key() == master.key() { PHONETIC_MATCH } else { 0.0 };
        CandidateScore {
            similarity,
            phonetic,
            total: similarity.max(phonetic),
        }
    }

    pub fn score_pair(&self, a: &str, b: &str) -> CandidateScore {
        self.candidate_score(&Description::new(a), &Description::new(b))
    }
}
