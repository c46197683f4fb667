use serde::{Deserialize, Serialize};

use crate::score::CandidateScore;

/// Which candidate a scan retains among those above the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// The last master row scoring strictly above the threshold wins,
    /// whatever its score relative to earlier candidates.
    #[default]
    LastExceeding,
    /// The highest-scoring row above the threshold wins; ties keep the earliest.
    HighestScore,
}

impl std::fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LastExceeding => write!(f, "last_exceeding"),
            Self::HighestScore => write!(f, "highest_score"),
        }
    }
}

impl std::str::FromStr for SelectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "last_exceeding" | "last" => Ok(Self::LastExceeding),
            "highest_score" | "highest" | "best" => Ok(Self::HighestScore),
            _ => Err(format!(
                "unknown policy: {s} (expected last_exceeding or highest_score)"
            )),
        }
    }
}

/// Fold state of one master scan.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Selection {
    /// Retained candidate: (master index, score).
    pub retained: Option<(usize, CandidateScore)>,
    /// Highest score seen, retained or not.
    pub best_seen: Option<CandidateScore>,
}

impl Selection {
    pub fn offer(
        mut self,
        policy: SelectionPolicy,
        threshold: f64,
        index: usize,
        score: CandidateScore,
    ) -> Self {
        if self.best_seen.map_or(true, |b| score.total > b.total) {
            self.best_seen = Some(score);
        }

        if score.total > threshold {
            let replace = match (policy, self.retained) {
                (SelectionPolicy::LastExceeding, _) | (_, None) => true,
                (SelectionPolicy::HighestScore, Some((_, kept))) => score.total > kept.total,
            };
            if replace {
                log::trace!("retain master row {index} (score {:.2})", score.total);
                self.retained = Some((index, score));
            }
        }

        self
    }

    /// Retained candidate if it clears the final `>=` acceptance test.
    pub fn accepted(&self, threshold: f64) -> Option<(usize, CandidateScore)> {
        self.retained.filter(|(_, s)| s.total >= threshold)
    }
}

/// Scan scored candidates in master order.
pub fn select_candidate<I>(candidates: I, threshold: f64, policy: SelectionPolicy) -> Selection
where
    I: IntoIterator<Item = (usize, CandidateScore)>,
{
    candidates
        .into_iter()
        .fold(Selection::default(), |sel, (index, score)| {
            sel.offer(policy, threshold, index, score)
        })
}
