//! Top-K selection over a score vector.
//!
//! Two phases: a quickselect partition moves the `k` best entries to the
//! front without ordering the rest, then only those `k` are sorted.
//!
//! Ordering is score descending. Equal scores are ordered by ascending
//! catalog position, so the output is fully determined by the input.

use std::cmp::Ordering;

/// Descending score, then ascending position. A total order over finite
/// and non-finite scores alike.
fn rank(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

/// Select the `k` highest scores as `(position, score)` pairs.
///
/// Returns `min(k, scores.len())` entries, best first.
pub fn select_top_k(scores: &[f32], k: usize) -> Vec<(usize, f32)> {
    let k = k.min(scores.len());
    if k == 0 {
        return vec![];
    }

    let mut candidates: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();

    if k < candidates.len() {
        candidates.select_nth_unstable_by(k - 1, rank);
        candidates.truncate(k);
    }

    candidates.sort_unstable_by(rank);
    candidates
}
