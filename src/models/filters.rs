use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use super::{Candidate, EntityRef, SpoilerLevel};

/// Inclusive length-class range filter (classes 1–5)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LengthRange {
    pub min: u8,
    pub max: u8,
}

impl LengthRange {
    pub fn contains(&self, length: u8) -> bool {
        (self.min..=self.max).contains(&length)
    }
}

/// Caller-supplied constraints on the candidate pool
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendFilters {
    /// Minimum bayesian rating on the 10–100 scale
    #[serde(default)]
    pub min_rating: Option<f32>,
    #[serde(default)]
    pub length_range: Option<LengthRange>,
    /// Candidates must carry every listed entity
    #[serde(default)]
    pub include_entities: Vec<EntityRef>,
    /// Candidates carrying any listed entity are dropped
    #[serde(default)]
    pub exclude_entities: Vec<EntityRef>,
    #[serde(default)]
    pub spoiler_level: SpoilerLevel,
    #[serde(default)]
    pub skip_cache: bool,
}

impl RecommendFilters {
    /// Whether a cached result may serve this request
    ///
    /// Every filter is applied at computation time, and cached rows carry
    /// neither rating nor length, so any non-default filter forces a
    /// fresh run.
    pub fn cacheable(&self) -> bool {
        !self.skip_cache
            && self.min_rating.is_none()
            && self.length_range.is_none()
            && self.include_entities.is_empty()
            && self.exclude_entities.is_empty()
            && self.spoiler_level == SpoilerLevel::None
    }

    /// Stable hash over the filter parameters and requested limit, used as
    /// the per-user cache key suffix
    pub fn params_hash(&self, limit: usize) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        limit.hash(&mut hasher);
        self.min_rating.map(f32::to_bits).hash(&mut hasher);
        self.length_range.hash(&mut hasher);
        self.include_entities.hash(&mut hasher);
        self.exclude_entities.hash(&mut hasher);
        self.spoiler_level.as_u8().hash(&mut hasher);
        hasher.finish()
    }

    /// Whether a candidate passes the hard filters
    pub fn matches(&self, candidate: &Candidate) -> bool {
        if let Some(min_rating) = self.min_rating {
            match candidate.rating {
                Some(rating) if rating >= min_rating => {}
                _ => return false,
            }
        }

        if let Some(range) = self.length_range {
            match candidate.length {
                Some(length) if range.contains(length) => {}
                _ => return false,
            }
        }

        if !self.include_entities.is_empty() || !self.exclude_entities.is_empty() {
            let refs: std::collections::HashSet<EntityRef> = super::EntityKind::ALL
                .iter()
                .flat_map(|&kind| candidate.entities.refs_of(kind))
                .collect();

            if !self.include_entities.iter().all(|e| refs.contains(e)) {
                return false;
            }
            if self.exclude_entities.iter().any(|e| refs.contains(e)) {
                return false;
            }
        }

        true
    }
}
