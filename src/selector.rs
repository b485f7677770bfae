//! Top-K keyframe selection.

use serde::Serialize;

use crate::scorer::ScoredCandidate;

/// Score statistics over every candidate of a run, selected or not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreStatistics {
    /// Highest change score.
    pub max_score: f64,
    /// Mean change score.
    pub avg_score: f64,
    /// Number of candidates the statistics cover.
    pub candidate_count: usize,
}

impl ScoreStatistics {
    /// Compute statistics over `candidates`. All zero when empty.
    pub fn from_candidates(candidates: &[ScoredCandidate]) -> Self {
        if candidates.is_empty() {
            return Self::default();
        }
        let max_score = candidates
            .iter()
            .map(|candidate| candidate.change_score)
            .fold(0.0, f64::max);
        let total: f64 = candidates.iter().map(|candidate| candidate.change_score).sum();
        Self {
            max_score,
            avg_score: total / candidates.len() as f64,
            candidate_count: candidates.len(),
        }
    }
}

/// Pick the `k` best-ranked candidates and return them in timestamp order.
///
/// Ranking is by change score, highest first; ties go to the earlier
/// timestamp. If there are `k` or fewer candidates all of them are returned.
/// There is no de-duplication beyond what the scores already express.
pub fn select_top_k(mut candidates: Vec<ScoredCandidate>, k: usize) -> Vec<ScoredCandidate> {
    candidates.sort_by(ScoredCandidate::rank_cmp);
    candidates.truncate(k);
    candidates.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.index.cmp(&b.index)));

    log::debug!(
        "Selected frames {:?}",
        candidates.iter().map(|candidate| candidate.index).collect::<Vec<_>>()
    );
    candidates
}
