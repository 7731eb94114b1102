use std::collections::HashMap;

use super::{into_ranked, Signal, SignalContext, SignalError, SignalScores};
use crate::models::{SignalKind, UserProfile};

/// Collaborative latent-factor signal
///
/// Folds the user into the offline factorization on the fly: the
/// pseudo-user vector is the vote-weighted average of the latent factors
/// of rated items, so users absent from the last training run are still
/// served. Candidate score is the dot product with its latent factor.
pub struct CollaborativeSignal;

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[async_trait::async_trait]
impl Signal for CollaborativeSignal {
    fn kind(&self) -> SignalKind {
        SignalKind::Collaborative
    }

    async fn recommend(
        &self,
        profile: &UserProfile,
        ctx: &SignalContext,
    ) -> Result<SignalScores, SignalError> {
        let mut pseudo_user: Vec<f32> = Vec::new();
        let mut total_weight = 0.0f32;

        for rating in &profile.ratings {
            let weight = rating.weight();
            if weight == 0.0 {
                continue;
            }
            let Some(factor) = ctx.store.get_latent_factor(rating.item_id).await? else {
                continue;
            };
            if pseudo_user.is_empty() {
                pseudo_user = vec![0.0; factor.len()];
            }
            if factor.len() != pseudo_user.len() {
                // Stale artifact from a different training run; skip it.
                tracing::warn!(
                    item_id = rating.item_id,
                    expected = pseudo_user.len(),
                    got = factor.len(),
                    "Latent factor dimension mismatch"
                );
                continue;
            }
            for (acc, value) in pseudo_user.iter_mut().zip(&factor) {
                *acc += value * weight;
            }
            total_weight += weight.abs();
        }

        if pseudo_user.is_empty() || total_weight == 0.0 {
            return Ok(Vec::new());
        }
        for value in &mut pseudo_user {
            *value /= total_weight;
        }

        let mut scores = HashMap::new();
        for candidate in ctx.candidates.iter() {
            if candidate.latent_factor.len() != pseudo_user.len() {
                continue;
            }
            let score = dot(&pseudo_user, &candidate.latent_factor);
            if score > 0.0 {
                scores.insert(candidate.id, score);
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
    async fn test_pseudo_user_scores_aligned_candidate() {
        let mut store = MockCandidateStore::new();
        store
            .expect_get_latent_factor()
            .returning(|_| Ok(Some(vec![1.0, 0.0])));

        let mut aligned = candidate(10);
        aligned.latent_factor = vec![1.0, 0.0];
        let mut opposed = candidate(11);
        opposed.latent_factor = vec![-1.0, 0.0];

        let ctx = context(vec![aligned, opposed], store);
        let scores = CollaborativeSignal
            .recommend(&profile(vec![(1, 100)]), &ctx)
            .await
            .unwrap();

        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].0, 10);
        assert!((scores[0].1 - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_untrained_items_yield_empty_signal() {
        let mut store = MockCandidateStore::new();
        store.expect_get_latent_factor().returning(|_| Ok(None));

        let mut c = candidate(10);
        c.latent_factor = vec![1.0, 0.0];

        let ctx = context(vec![c], store);
        let scores = CollaborativeSignal
            .recommend(&profile(vec![(1, 90), (2, 80)]), &ctx)
            .await
            .unwrap();

        assert!(scores.is_empty());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_candidate_skipped() {
        let mut store = MockCandidateStore::new();
        store
            .expect_get_latent_factor()
            .returning(|_| Ok(Some(vec![1.0, 0.0])));

        let mut wrong_dims = candidate(10);
        wrong_dims.latent_factor = vec![1.0, 0.0, 0.5];

        let ctx = context(vec![wrong_dims], store);
        let scores = CollaborativeSignal
            .recommend(&profile(vec![(1, 90)]), &ctx)
            .await
            .unwrap();

        assert!(scores.is_empty());
    }
}
