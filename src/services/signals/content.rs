use std::collections::HashMap;

use super::{into_ranked, Signal, SignalContext, SignalError, SignalScores};
use crate::models::{SignalKind, SparseAccumulator, UserProfile};

/// Content-similarity signal
///
/// Builds a user tag-profile vector as the vote-weighted sum of rated
/// items' content vectors: above-midpoint votes pull the profile toward an
/// item's tags, below-midpoint votes push away. The profile is normalized
/// by total absolute weight, then L2-normalized, so a candidate's score is
/// the plain dot product against its (already unit-norm) content vector,
/// i.e. cosine similarity.
pub struct ContentSignal;

#[async_trait::async_trait]
impl Signal for ContentSignal {
    fn kind(&self) -> SignalKind {
        SignalKind::Content
    }

    async fn recommend(
        &self,
        profile: &UserProfile,
        ctx: &SignalContext,
    ) -> Result<SignalScores, SignalError> {
        let mut acc = SparseAccumulator::new();
        let mut total_weight = 0.0f32;

        for rating in &profile.ratings {
            let weight = rating.weight();
            if weight == 0.0 {
                // Midpoint votes carry no preference either way.
                continue;
            }
            if let Some(vector) = ctx.store.get_content_vector(rating.item_id).await? {
                acc.add_scaled(&vector, weight);
                total_weight += weight.abs();
            }
        }

        if acc.is_empty() || total_weight == 0.0 {
            return Ok(Vec::new());
        }

        let user_vector = acc
            .into_vector()
            .scaled(1.0 / total_weight)
            .l2_normalized();

        let mut scores = HashMap::new();
        for candidate in ctx.candidates.iter() {
            let similarity = user_vector.dot(&candidate.content_vector);
            if similarity > 0.0 {
                scores.insert(candidate.id, similarity);
            }
        }

        Ok(into_ranked(scores, ctx.pool_size))
    }
}
