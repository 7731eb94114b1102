use std::collections::HashMap;

use super::{into_ranked, Signal, SignalContext, SignalError, SignalScores};
use crate::models::{SignalKind, UserProfile};

/// Precomputed-similarity signal
///
/// Cheap O(1) lookups into the daily top-K content-similarity neighbor
/// table, one lookup per liked item. Exists as a low-latency parallel to
/// the full content signal and as its fallback when the vector tables are
/// degraded.
pub struct PrecomputedSignal;

#[async_trait::async_trait]
impl Signal for PrecomputedSignal {
    fn kind(&self) -> SignalKind {
        SignalKind::Precomputed
    }

    async fn recommend(
        &self,
        profile: &UserProfile,
        ctx: &SignalContext,
    ) -> Result<SignalScores, SignalError> {
        let mut scores: HashMap<i64, f32> = HashMap::new();

        for rating in &profile.ratings {
            let weight = rating.weight();
            if weight <= 0.0 {
                continue;
            }
            for (neighbor_id, similarity) in
                ctx.store.get_precomputed_neighbors(rating.item_id).await?
            {
                if !ctx.is_candidate(neighbor_id) {
                    continue;
                }
                let entry = scores.entry(neighbor_id).or_insert(0.0);
                // Best weighted similarity across rated items.
                *entry = (*entry).max(similarity * weight);
            }
        }

        Ok(into_ranked(scores, ctx.pool_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::test_support::{candidate, context, profile};
    use crate::store::MockCandidateStore;

    #[tokio::test]
    async fn test_best_weighted_similarity_wins() {
        let mut store = MockCandidateStore::new();
        store.expect_get_precomputed_neighbors().returning(|item_id| {
            Ok(match item_id {
                1 => vec![(10, 0.9)],
                2 => vec![(10, 0.5)],
                _ => vec![],
            })
        });

        let ctx = context(vec![candidate(10)], store);
        // Vote 100 -> weight 1.0; vote 75 -> weight 0.5
        let scores = PrecomputedSignal
            .recommend(&profile(vec![(1, 100), (2, 75)]), &ctx)
            .await
            .unwrap();

        assert_eq!(scores.len(), 1);
        assert!((scores[0].1 - 0.9).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_neighbors_outside_pool_skipped() {
        let mut store = MockCandidateStore::new();
        store
            .expect_get_precomputed_neighbors()
            .returning(|_| Ok(vec![(77, 0.8)]));

        let ctx = context(vec![candidate(10)], store);
        let scores = PrecomputedSignal
            .recommend(&profile(vec![(1, 100)]), &ctx)
            .await
            .unwrap();

        assert!(scores.is_empty());
    }
}
