use std::collections::{HashMap, HashSet};

use crate::models::{Candidate, CombinedScore, RerankedItem, SpoilerLevel};

/// Tuning knobs for the diversity rerank
#[derive(Debug, Clone, Copy)]
pub struct RerankConfig {
    /// MMR balance: 1.0 = pure relevance, 0.0 = pure diversity
    pub lambda: f32,
    /// Strength of the popularity novelty penalty
    pub novelty_weight: f32,
    /// Hard floor on distinct developers in the output
    pub min_unique_developers: usize,
    /// Score haircut applied to repair substitutions, keeping them traceable
    pub swap_penalty: f32,
    /// Minimum tag vote score for the diversity tag set
    pub strong_tag_threshold: f32,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            lambda: 0.6,
            novelty_weight: 0.15,
            min_unique_developers: 3,
            swap_penalty: 0.05,
            strong_tag_threshold: 1.5,
        }
    }
}

/// Diversity-relevant attributes of one pool entry
#[derive(Debug, Clone, Default)]
pub struct RerankFeatures {
    pub developers: HashSet<i64>,
    pub release_year: Option<i32>,
    pub strong_tags: HashSet<i64>,
    pub popularity: u32,
}

impl RerankFeatures {
    pub fn from_candidate(
        candidate: &Candidate,
        config: &RerankConfig,
        spoiler_level: SpoilerLevel,
    ) -> Self {
        Self {
            developers: candidate.developers.clone(),
            release_year: candidate.release_year,
            strong_tags: candidate.strong_tags(config.strong_tag_threshold, spoiler_level),
            popularity: candidate.popularity,
        }
    }
}

struct PoolEntry {
    combined: CombinedScore,
    features: RerankFeatures,
    /// Max-normalized combined score after the novelty penalty
    relevance: f32,
}

/// Reorders the combined ranking to balance relevance against catalog
/// diversity (developer, era, tag overlap)
///
/// Greedy MMR selection over max-normalized, novelty-penalized scores,
/// followed by a developer-coverage repair pass. Never introduces
/// candidates absent from the input pool and returns exactly
/// `min(limit, pool)` entries.
pub fn rerank(
    pool: Vec<(CombinedScore, RerankFeatures)>,
    limit: usize,
    config: &RerankConfig,
) -> Vec<RerankedItem> {
    if pool.is_empty() || limit == 0 {
        return Vec::new();
    }

    let max_score = pool
        .iter()
        .map(|(c, _)| c.score)
        .fold(f32::NEG_INFINITY, f32::max);
    let max_popularity = pool.iter().map(|(_, f)| f.popularity).max().unwrap_or(0);

    let mut remaining: Vec<PoolEntry> = pool
        .into_iter()
        .map(|(combined, features)| {
            let normalized = if max_score > 0.0 {
                combined.score / max_score
            } else {
                0.0
            };
            let relevance = normalized * novelty_factor(features.popularity, max_popularity, config);
            PoolEntry {
                combined,
                features,
                relevance,
            }
        })
        .collect();

    // Greedy MMR: first pick by relevance alone, then trade relevance
    // against similarity to the selected set.
    let target = limit.min(remaining.len());
    let mut selected: Vec<PoolEntry> = Vec::with_capacity(target);

    while selected.len() < target {
        let mut best_idx = 0;
        let mut best_score = f32::NEG_INFINITY;

        for (idx, entry) in remaining.iter().enumerate() {
            let mmr = if selected.is_empty() {
                entry.relevance
            } else {
                let max_sim = selected
                    .iter()
                    .map(|s| similarity(&entry.features, &s.features))
                    .fold(0.0f32, f32::max);
                config.lambda * entry.relevance - (1.0 - config.lambda) * max_sim
            };
            if mmr > best_score {
                best_score = mmr;
                best_idx = idx;
            }
        }

        selected.push(remaining.swap_remove(best_idx));
    }

    let swapped_in = repair_developer_coverage(&mut selected, &mut remaining, config);

    selected
        .into_iter()
        .map(|entry| {
            let penalty = if swapped_in.contains(&entry.combined.item_id) {
                1.0 - config.swap_penalty
            } else {
                1.0
            };
            RerankedItem {
                item_id: entry.combined.item_id,
                original_score: entry.combined.score,
                reranked_score: entry.relevance * penalty,
                per_signal: entry.combined.per_signal,
                methods_matched: entry.combined.methods_matched,
                reasons: Vec::new(),
            }
        })
        .collect()
}

/// More popular items lose more score: 1 - w * log1p(pop) / log1p(max_pop)
fn novelty_factor(popularity: u32, max_popularity: u32, config: &RerankConfig) -> f32 {
    if max_popularity == 0 {
        return 1.0;
    }
    let ratio = (popularity as f32).ln_1p() / (max_popularity as f32).ln_1p();
    1.0 - config.novelty_weight * ratio
}

/// Mean over whichever similarity components both entries have data for:
/// developer overlap (1/0), strong-tag Jaccard, damped era proximity
fn similarity(a: &RerankFeatures, b: &RerankFeatures) -> f32 {
    let mut sum = 0.0;
    let mut components = 0;

    if !a.developers.is_empty() && !b.developers.is_empty() {
        sum += if a.developers.is_disjoint(&b.developers) {
            0.0
        } else {
            1.0
        };
        components += 1;
    }

    if !a.strong_tags.is_empty() && !b.strong_tags.is_empty() {
        let intersection = a.strong_tags.intersection(&b.strong_tags).count();
        let union = a.strong_tags.union(&b.strong_tags).count();
        sum += intersection as f32 / union as f32;
        components += 1;
    }

    if let (Some(year_a), Some(year_b)) = (a.release_year, b.release_year) {
        let gap = (year_a - year_b).abs() as f32;
        sum += 0.3 * (1.0 - gap / 20.0).max(0.0);
        components += 1;
    }

    if components == 0 {
        0.0
    } else {
        sum / components as f32
    }
}

/// Swaps the lowest-scored duplicate-developer picks for the best
/// unselected candidates from unrepresented developers until the distinct
/// developer floor is met or no swap is possible. Returns the swapped-in
/// item ids so their penalty stays visible. List length never changes.
fn repair_developer_coverage(
    selected: &mut [PoolEntry],
    remaining: &mut Vec<PoolEntry>,
    config: &RerankConfig,
) -> HashSet<i64> {
    let mut swapped_in = HashSet::new();

    loop {
        let mut dev_counts: HashMap<i64, usize> = HashMap::new();
        for entry in selected.iter() {
            for &dev in &entry.features.developers {
                *dev_counts.entry(dev).or_insert(0) += 1;
            }
        }

        if dev_counts.len() >= config.min_unique_developers {
            break;
        }

        // Lowest-relevance selected entry whose developers all appear on
        // other selected entries too.
        let victim_idx = selected
            .iter()
            .enumerate()
            .filter(|(_, entry)| {
                !entry.features.developers.is_empty()
                    && entry
                        .features
                        .developers
                        .iter()
                        .all(|dev| dev_counts.get(dev).copied().unwrap_or(0) > 1)
            })
            .min_by(|(_, a), (_, b)| {
                a.relevance
                    .partial_cmp(&b.relevance)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(idx, _)| idx);

        let Some(victim_idx) = victim_idx else { break };

        // Best unselected candidate from a developer not yet represented.
        let replacement_idx = remaining
            .iter()
            .enumerate()
            .filter(|(_, entry)| {
                !entry.features.developers.is_empty()
                    && entry
                        .features
                        .developers
                        .iter()
                        .all(|dev| !dev_counts.contains_key(dev))
            })
            .max_by(|(_, a), (_, b)| {
                a.relevance
                    .partial_cmp(&b.relevance)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(idx, _)| idx);

        let Some(replacement_idx) = replacement_idx else {
            break;
        };

        let replacement = remaining.swap_remove(replacement_idx);
        tracing::debug!(
            out = selected[victim_idx].combined.item_id,
            in_ = replacement.combined.item_id,
            "Developer coverage repair swap"
        );
        swapped_in.insert(replacement.combined.item_id);
        let victim = std::mem::replace(&mut selected[victim_idx], replacement);
        remaining.push(victim);
    }

    swapped_in
}
