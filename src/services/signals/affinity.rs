use std::collections::HashMap;

use super::{into_ranked, Signal, SignalContext, SignalError, SignalScores};
use crate::models::{EntityKind, SignalKind, UserProfile};

/// Entity-affinity signal, one instance per entity kind
///
/// A candidate's score is the sum of the user's affinity weights over the
/// candidate's associations of this kind. Spoiler gating happens upstream:
/// the candidate snapshot only carries associations visible at the
/// caller's spoiler level. With an empty affinity map (extractor down or
/// new user) the signal finds nothing.
pub struct AffinitySignal {
    entity_kind: EntityKind,
}

impl AffinitySignal {
    pub fn new(entity_kind: EntityKind) -> Self {
        Self { entity_kind }
    }
}

#[async_trait::async_trait]
impl Signal for AffinitySignal {
    fn kind(&self) -> SignalKind {
        SignalKind::Affinity(self.entity_kind)
    }

    async fn recommend(
        &self,
        profile: &UserProfile,
        ctx: &SignalContext,
    ) -> Result<SignalScores, SignalError> {
        if !profile.affinity.has_kind(self.entity_kind) {
            return Ok(Vec::new());
        }

        let mut scores = HashMap::new();
        for candidate in ctx.candidates.iter() {
            let score: f32 = candidate
                .entities
                .refs_of(self.entity_kind)
                .iter()
                .map(|entity| profile.affinity.weight(entity))
                .sum();
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
    use crate::models::{
        EntityAffinityMap, EntityRef, Rating, SpoilerLevel, StaffAssociation, TagAssociation,
    };
    use crate::services::signals::test_support::{candidate, context};
    use crate::store::MockCandidateStore;

    fn profile_with_affinity(weights: Vec<(EntityKind, i64, f32)>) -> UserProfile {
        let map = weights
            .into_iter()
            .map(|(kind, id, w)| (EntityRef::new(kind, id), w))
            .collect();
        UserProfile::new(
            1,
            vec![Rating {
                item_id: 1,
                vote: 80,
            }],
            EntityAffinityMap::new(map),
        )
    }

    fn tag(tag_id: i64) -> TagAssociation {
        TagAssociation {
            tag_id,
            score: 2.0,
            spoiler: SpoilerLevel::None,
            sexual: false,
        }
    }

    #[tokio::test]
    async fn test_sums_affinity_over_matching_tags() {
        let mut scored = candidate(10);
        scored.entities.tags = vec![tag(1), tag(2), tag(3)];
        let mut unmatched = candidate(11);
        unmatched.entities.tags = vec![tag(9)];

        let ctx = context(vec![scored, unmatched], MockCandidateStore::new());
        let profile = profile_with_affinity(vec![
            (EntityKind::Tag, 1, 0.6),
            (EntityKind::Tag, 3, 0.3),
        ]);

        let scores = AffinitySignal::new(EntityKind::Tag)
            .recommend(&profile, &ctx)
            .await
            .unwrap();

        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].0, 10);
        assert!((scores[0].1 - 0.9).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_kind_isolation_staff_ignores_tag_weights() {
        let mut c = candidate(10);
        c.entities.tags = vec![tag(1)];
        c.entities.staff = vec![StaffAssociation {
            staff_id: 1,
            role: "scenario".into(),
        }];

        let ctx = context(vec![c], MockCandidateStore::new());
        // Same numeric id, but a tag weight must not feed the staff signal.
        let profile = profile_with_affinity(vec![(EntityKind::Tag, 1, 0.8)]);

        let scores = AffinitySignal::new(EntityKind::Staff)
            .recommend(&profile, &ctx)
            .await
            .unwrap();

        assert!(scores.is_empty());
    }

    #[tokio::test]
    async fn test_empty_affinity_map_finds_nothing() {
        let mut c = candidate(10);
        c.entities.tags = vec![tag(1)];

        let ctx = context(vec![c], MockCandidateStore::new());
        let profile = profile_with_affinity(vec![]);

        let scores = AffinitySignal::new(EntityKind::Tag)
            .recommend(&profile, &ctx)
            .await
            .unwrap();

        assert!(scores.is_empty());
    }

    #[tokio::test]
    async fn test_net_negative_affinity_dropped() {
        let mut c = candidate(10);
        c.entities.tags = vec![tag(1), tag(2)];

        let ctx = context(vec![c], MockCandidateStore::new());
        let profile = profile_with_affinity(vec![
            (EntityKind::Tag, 1, 0.2),
            (EntityKind::Tag, 2, -0.5),
        ]);

        let scores = AffinitySignal::new(EntityKind::Tag)
            .recommend(&profile, &ctx)
            .await
            .unwrap();

        assert!(scores.is_empty());
    }
}
