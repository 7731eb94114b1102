use std::collections::HashMap;

use crate::models::{CombinedScore, ItemId, SignalKind};
use crate::services::signals::SignalScores;

/// Agreement bonus: candidates scored positively by at least this many
/// signals get the strong multiplier
const STRONG_AGREEMENT_COUNT: u32 = 7;
const STRONG_AGREEMENT_BONUS: f32 = 1.25;
const WEAK_AGREEMENT_COUNT: u32 = 5;
const WEAK_AGREEMENT_BONUS: f32 = 1.15;

/// Blends the per-signal rankings into one combined ranking
///
/// Each signal's raw scores are min–max scaled to [0, 1] over the
/// candidates it scored; a candidate absent from a signal contributes 0
/// for that signal. Default weighting is equal across active (non-empty)
/// signals; `weight_overrides` replaces individual weights. Output is
/// sorted descending with ties keeping encounter order (stable sort over
/// the merged-map materialization order).
pub fn combine(
    signal_results: &[(SignalKind, SignalScores)],
    weight_overrides: Option<&HashMap<SignalKind, f32>>,
) -> Vec<CombinedScore> {
    let active: Vec<&(SignalKind, SignalScores)> = signal_results
        .iter()
        .filter(|(_, scores)| !scores.is_empty())
        .collect();

    if active.is_empty() {
        return Vec::new();
    }

    let default_weight = 1.0 / active.len() as f32;
    let mut combined: HashMap<ItemId, CombinedScore> = HashMap::new();
    let mut encounter: Vec<ItemId> = Vec::new();

    for (kind, scores) in &active {
        let normalized = min_max_normalize(scores);
        let weight = weight_overrides
            .and_then(|w| w.get(kind).copied())
            .unwrap_or(default_weight);

        for ((item_id, raw), (_, norm)) in scores.iter().zip(&normalized) {
            let entry = combined.entry(*item_id).or_insert_with(|| {
                encounter.push(*item_id);
                CombinedScore {
                    item_id: *item_id,
                    score: 0.0,
                    per_signal: HashMap::new(),
                    methods_matched: 0,
                }
            });
            entry.score += weight * norm;
            entry.per_signal.insert(*kind, *norm);
            if *raw > 0.0 {
                entry.methods_matched += 1;
            }
        }
    }

    let mut results: Vec<CombinedScore> = encounter
        .into_iter()
        .filter_map(|id| combined.remove(&id))
        .map(|mut entry| {
            entry.score *= agreement_bonus(entry.methods_matched);
            entry
        })
        .collect();

    // Stable: equal scores keep encounter order.
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results
}

/// Min–max scaling to [0, 1]; a degenerate signal (one unique value) maps
/// every candidate to 0.5 instead of dividing by zero
fn min_max_normalize(scores: &SignalScores) -> SignalScores {
    let min = scores.iter().map(|&(_, s)| s).fold(f32::INFINITY, f32::min);
    let max = scores
        .iter()
        .map(|&(_, s)| s)
        .fold(f32::NEG_INFINITY, f32::max);

    if (max - min).abs() < f32::EPSILON {
        return scores.iter().map(|&(id, _)| (id, 0.5)).collect();
    }

    scores
        .iter()
        .map(|&(id, s)| (id, (s - min) / (max - min)))
        .collect()
}

fn agreement_bonus(methods_matched: u32) -> f32 {
    if methods_matched >= STRONG_AGREEMENT_COUNT {
        STRONG_AGREEMENT_BONUS
    } else if methods_matched >= WEAK_AGREEMENT_COUNT {
        WEAK_AGREEMENT_BONUS
    } else {
        1.0
    }
}
