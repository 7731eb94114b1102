use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod candidate;
pub mod filters;
pub mod profile;
pub mod results;
pub mod vector;

pub use candidate::{
    Candidate, EntityAssociations, ProducerAssociation, StaffAssociation, TagAssociation,
    TraitAssociation,
};
pub use filters::{LengthRange, RecommendFilters};
pub use profile::{EntityAffinityMap, Rating, UserProfile};
pub use results::{CombinedScore, RerankedItem, SignalKind};
pub use vector::{SparseAccumulator, SparseVector};

/// Catalog item identifier (visual novel)
pub type ItemId = i64;

/// User account identifier
pub type UserId = i64;

/// Kind of catalog entity a user can have an affinity for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Tag,
    Trait,
    Staff,
    Seiyuu,
    Producer,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Tag,
        EntityKind::Trait,
        EntityKind::Staff,
        EntityKind::Seiyuu,
        EntityKind::Producer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Tag => "tag",
            EntityKind::Trait => "trait",
            EntityKind::Staff => "staff",
            EntityKind::Seiyuu => "seiyuu",
            EntityKind::Producer => "producer",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a specific catalog entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: i64,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: i64) -> Self {
        Self { kind, id }
    }
}

/// Maximum spoiler severity the caller is willing to see
///
/// Tag and trait associations carry a spoiler level; associations above the
/// requested level are invisible to scoring and explanations.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SpoilerLevel {
    #[default]
    None,
    Minor,
    Major,
}

impl SpoilerLevel {
    /// Whether an association at `level` is visible at this setting
    pub fn allows(&self, level: SpoilerLevel) -> bool {
        level <= *self
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            SpoilerLevel::None => 0,
            SpoilerLevel::Minor => 1,
            SpoilerLevel::Major => 2,
        }
    }
}
