use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{EntityAssociations, EntityKind, EntityRef, ItemId, UserId};

/// Midpoint of the 10–100 vote scale; votes at the midpoint carry no weight
pub const VOTE_MIDPOINT: f32 = 50.0;
/// Half of the vote range, so weights land in roughly [-0.8, 1.0]
pub const VOTE_HALF_RANGE: f32 = 50.0;

/// One vote from a user's rating history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub item_id: ItemId,
    /// Vote on the 10–100 scale
    pub vote: u8,
}

impl Rating {
    /// Linear preference weight: +1.0 at vote 100, 0.0 at the midpoint,
    /// negative below it
    pub fn weight(&self) -> f32 {
        (self.vote as f32 - VOTE_MIDPOINT) / VOTE_HALF_RANGE
    }
}

/// Per-user weighted preference over catalog entities
///
/// Built once per request from the preference-analytics service; empty when
/// that service is unavailable, which simply disables the affinity signals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityAffinityMap {
    weights: HashMap<EntityRef, f32>,
}

impl EntityAffinityMap {
    pub fn new(weights: HashMap<EntityRef, f32>) -> Self {
        Self { weights }
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn weight(&self, entity: &EntityRef) -> f32 {
        self.weights.get(entity).copied().unwrap_or(0.0)
    }

    /// Whether any entity of this kind carries weight
    pub fn has_kind(&self, kind: EntityKind) -> bool {
        self.weights.keys().any(|e| e.kind == kind)
    }

    /// Positively weighted entities of `kind` present on the candidate,
    /// strongest first; feeds the explanation generator
    pub fn matched_on(&self, kind: EntityKind, entities: &EntityAssociations) -> Vec<(EntityRef, f32)> {
        let mut matched: Vec<(EntityRef, f32)> = entities
            .refs_of(kind)
            .into_iter()
            .filter_map(|entity| {
                let weight = self.weight(&entity);
                (weight > 0.0).then_some((entity, weight))
            })
            .collect();
        matched.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        matched
    }
}

/// A user's rating history plus derived entity affinities
///
/// Immutable for the duration of one recommendation call.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub user_id: UserId,
    /// Ordered rating history, most recent last
    pub ratings: Vec<Rating>,
    pub affinity: EntityAffinityMap,
}

impl UserProfile {
    pub fn new(user_id: UserId, ratings: Vec<Rating>, affinity: EntityAffinityMap) -> Self {
        Self {
            user_id,
            ratings,
            affinity,
        }
    }

    pub fn rated_items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.ratings.iter().map(|r| r.item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_weight_full_positive() {
        let r = Rating {
            item_id: 1,
            vote: 100,
        };
        assert!((r.weight() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rating_weight_midpoint_is_zero() {
        let r = Rating {
            item_id: 1,
            vote: 50,
        };
        assert_eq!(r.weight(), 0.0);
    }

    #[test]
    fn test_rating_weight_low_vote_is_negative() {
        let r = Rating {
            item_id: 1,
            vote: 10,
        };
        assert!(r.weight() < 0.0);
    }

    #[test]
    fn test_affinity_missing_entity_is_zero() {
        let map = EntityAffinityMap::default();
        assert_eq!(map.weight(&EntityRef::new(EntityKind::Tag, 5)), 0.0);
    }

    #[test]
    fn test_affinity_has_kind() {
        let map = EntityAffinityMap::new(HashMap::from([(
            EntityRef::new(EntityKind::Staff, 9),
            0.7,
        )]));
        assert!(map.has_kind(EntityKind::Staff));
        assert!(!map.has_kind(EntityKind::Tag));
    }
}
