use std::collections::HashMap;

use super::{into_ranked, Signal, SignalContext, SignalError, SignalScores};
use crate::models::{SignalKind, UserProfile};

/// Item-item co-occurrence signal over the offline PMI table
///
/// PMI = log2(joint / (marginal_a * marginal_b / N)) rewards pairs rated
/// together more than chance predicts, which suppresses the popularity
/// bias of raw co-rating counts. A candidate reachable from several rated
/// items accumulates the sum of those PMI values (sum-of, not best-of:
/// being a strong neighbor of many rated titles should outrank being a
/// very strong neighbor of exactly one). Pairs whose co-rater count is
/// below the configured floor never contribute.
pub struct CooccurrenceSignal;

#[async_trait::async_trait]
impl Signal for CooccurrenceSignal {
    fn kind(&self) -> SignalKind {
        SignalKind::Cooccurrence
    }

    async fn recommend(
        &self,
        profile: &UserProfile,
        ctx: &SignalContext,
    ) -> Result<SignalScores, SignalError> {
        let mut scores: HashMap<i64, f32> = HashMap::new();

        for rating in &profile.ratings {
            if rating.weight() <= 0.0 {
                // Only liked items pull in their neighbors.
                continue;
            }
            for neighbor in ctx.store.get_pmi_neighbors(rating.item_id).await? {
                if neighbor.co_raters < ctx.min_co_raters {
                    continue;
                }
                if neighbor.pmi <= 0.0 {
                    continue;
                }
                if !ctx.is_candidate(neighbor.neighbor_id) {
                    continue;
                }
                *scores.entry(neighbor.neighbor_id).or_insert(0.0) += neighbor.pmi;
            }
        }

        Ok(into_ranked(scores, ctx.pool_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::test_support::{candidate, context, profile};
    use crate::store::{MockCandidateStore, PmiNeighbor};

    fn neighbor(neighbor_id: i64, pmi: f32, co_raters: u32) -> PmiNeighbor {
        PmiNeighbor {
            neighbor_id,
            pmi,
            co_raters,
        }
    }

    #[tokio::test]
    async fn test_sums_pmi_across_rated_items() {
        let mut store = MockCandidateStore::new();
        store.expect_get_pmi_neighbors().returning(|item_id| {
            Ok(match item_id {
                1 => vec![neighbor(10, 2.0, 50)],
                2 => vec![neighbor(10, 1.0, 50)],
                _ => vec![],
            })
        });

        let ctx = context(vec![candidate(10)], store);
        let scores = CooccurrenceSignal
            .recommend(&profile(vec![(1, 100), (2, 100)]), &ctx)
            .await
            .unwrap();

        assert_eq!(scores.len(), 1);
        // Sum-of aggregation: 2.0 + 1.0
        assert!((scores[0].1 - 3.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_co_rater_floor_excludes_pair_entirely() {
        let mut store = MockCandidateStore::new();
        // 19 co-raters with a floor of 20: must never appear.
        store
            .expect_get_pmi_neighbors()
            .returning(|_| Ok(vec![neighbor(10, 5.0, 19)]));

        let ctx = context(vec![candidate(10)], store);
        let scores = CooccurrenceSignal
            .recommend(&profile(vec![(1, 100)]), &ctx)
            .await
            .unwrap();

        assert!(scores.is_empty());
    }

    #[tokio::test]
    async fn test_non_candidate_neighbors_ignored() {
        let mut store = MockCandidateStore::new();
        store
            .expect_get_pmi_neighbors()
            .returning(|_| Ok(vec![neighbor(99, 3.0, 50)]));

        let ctx = context(vec![candidate(10)], store);
        let scores = CooccurrenceSignal
            .recommend(&profile(vec![(1, 100)]), &ctx)
            .await
            .unwrap();

        assert!(scores.is_empty());
    }

    #[tokio::test]
    async fn test_disliked_items_pull_no_neighbors() {
        let mut store = MockCandidateStore::new();
        store.expect_get_pmi_neighbors().never();

        let ctx = context(vec![candidate(10)], store);
        let scores = CooccurrenceSignal
            .recommend(&profile(vec![(1, 30)]), &ctx)
            .await
            .unwrap();

        assert!(scores.is_empty());
    }
}
