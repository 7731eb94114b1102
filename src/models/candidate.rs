use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{EntityKind, EntityRef, ItemId, SparseVector, SpoilerLevel};

/// Tag attached to an item with its aggregate vote score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagAssociation {
    pub tag_id: i64,
    /// Aggregate tag vote score, 0.0–3.0
    pub score: f32,
    pub spoiler: SpoilerLevel,
    pub sexual: bool,
}

/// Character trait attached to an item (through its characters)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitAssociation {
    pub trait_id: i64,
    pub spoiler: SpoilerLevel,
}

/// Staff credit on an item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffAssociation {
    pub staff_id: i64,
    /// Credit role (scenario, art, music, ...)
    pub role: String,
}

/// Producer credit on an item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProducerAssociation {
    pub producer_id: i64,
    pub developer: bool,
    pub publisher: bool,
}

/// All entity associations of one item, already filtered to the caller's
/// spoiler level by the candidate store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityAssociations {
    pub tags: Vec<TagAssociation>,
    pub traits: Vec<TraitAssociation>,
    pub staff: Vec<StaffAssociation>,
    /// Voice actor staff ids
    pub seiyuu: Vec<i64>,
    pub producers: Vec<ProducerAssociation>,
}

impl EntityAssociations {
    /// Entity references of one kind, for affinity scoring
    pub fn refs_of(&self, kind: EntityKind) -> Vec<EntityRef> {
        match kind {
            EntityKind::Tag => self
                .tags
                .iter()
                .map(|t| EntityRef::new(kind, t.tag_id))
                .collect(),
            EntityKind::Trait => self
                .traits
                .iter()
                .map(|t| EntityRef::new(kind, t.trait_id))
                .collect(),
            EntityKind::Staff => self
                .staff
                .iter()
                .map(|s| EntityRef::new(kind, s.staff_id))
                .collect(),
            EntityKind::Seiyuu => self
                .seiyuu
                .iter()
                .map(|&id| EntityRef::new(kind, id))
                .collect(),
            EntityKind::Producer => self
                .producers
                .iter()
                .map(|p| EntityRef::new(kind, p.producer_id))
                .collect(),
        }
    }
}

/// Read-only snapshot of an unseen catalog item for one recommendation call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: ItemId,
    /// IDF-weighted, L2-normalized tag vector from the offline vectorizer
    pub content_vector: SparseVector,
    /// Latent factor from the offline matrix factorization (empty if the
    /// item was not in the last training run)
    pub latent_factor: Vec<f32>,
    pub developers: HashSet<i64>,
    pub release_year: Option<i32>,
    /// Vote count, used as the popularity proxy by the novelty penalty
    pub popularity: u32,
    /// Bayesian average rating on the 10–100 scale
    pub rating: Option<f32>,
    /// Length class 1 (very short) – 5 (very long)
    pub length: Option<u8>,
    pub entities: EntityAssociations,
}

impl Candidate {
    /// Strong tags for diversity comparisons: score at or above `threshold`,
    /// non-sexual, within `spoiler_level`
    pub fn strong_tags(&self, threshold: f32, spoiler_level: SpoilerLevel) -> HashSet<i64> {
        self.entities
            .tags
            .iter()
            .filter(|t| t.score >= threshold && !t.sexual && spoiler_level.allows(t.spoiler))
            .map(|t| t.tag_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged_candidate() -> Candidate {
        Candidate {
            id: 17,
            content_vector: SparseVector::default(),
            latent_factor: vec![],
            developers: HashSet::from([3]),
            release_year: Some(2004),
            popularity: 12000,
            rating: Some(84.0),
            length: Some(4),
            entities: EntityAssociations {
                tags: vec![
                    TagAssociation {
                        tag_id: 1,
                        score: 2.8,
                        spoiler: SpoilerLevel::None,
                        sexual: false,
                    },
                    TagAssociation {
                        tag_id: 2,
                        score: 2.9,
                        spoiler: SpoilerLevel::Major,
                        sexual: false,
                    },
                    TagAssociation {
                        tag_id: 3,
                        score: 2.5,
                        spoiler: SpoilerLevel::None,
                        sexual: true,
                    },
                    TagAssociation {
                        tag_id: 4,
                        score: 0.4,
                        spoiler: SpoilerLevel::None,
                        sexual: false,
                    },
                ],
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_strong_tags_filters_weak_sexual_and_spoilers() {
        let candidate = tagged_candidate();
        let strong = candidate.strong_tags(1.0, SpoilerLevel::None);
        assert_eq!(strong, HashSet::from([1]));
    }

    #[test]
    fn test_strong_tags_spoiler_level_widens_set() {
        let candidate = tagged_candidate();
        let strong = candidate.strong_tags(1.0, SpoilerLevel::Major);
        assert_eq!(strong, HashSet::from([1, 2]));
    }

    #[test]
    fn test_refs_of_producer() {
        let assoc = EntityAssociations {
            producers: vec![ProducerAssociation {
                producer_id: 42,
                developer: true,
                publisher: false,
            }],
            ..Default::default()
        };
        let refs = assoc.refs_of(EntityKind::Producer);
        assert_eq!(refs, vec![EntityRef::new(EntityKind::Producer, 42)]);
    }
}
