use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use super::{EntityKind, ItemId};

/// Closed set of scoring strategies feeding the blend
///
/// The affinity strategy runs once per entity kind, so nine signal
/// instances exist in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Content,
    Collaborative,
    Cooccurrence,
    Precomputed,
    Affinity(EntityKind),
}

impl SignalKind {
    pub const COUNT: usize = 9;

    pub fn all() -> Vec<SignalKind> {
        let mut kinds = vec![
            SignalKind::Content,
            SignalKind::Collaborative,
            SignalKind::Cooccurrence,
            SignalKind::Precomputed,
        ];
        kinds.extend(EntityKind::ALL.iter().map(|&k| SignalKind::Affinity(k)));
        kinds
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Content => "content",
            SignalKind::Collaborative => "collaborative",
            SignalKind::Cooccurrence => "cooccurrence",
            SignalKind::Precomputed => "precomputed",
            SignalKind::Affinity(EntityKind::Tag) => "affinity_tag",
            SignalKind::Affinity(EntityKind::Trait) => "affinity_trait",
            SignalKind::Affinity(EntityKind::Staff) => "affinity_staff",
            SignalKind::Affinity(EntityKind::Seiyuu) => "affinity_seiyuu",
            SignalKind::Affinity(EntityKind::Producer) => "affinity_producer",
        }
    }
}

impl Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SignalKind::all()
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown signal kind: {s}"))
    }
}

// String (de)serialization so SignalKind works as a JSON map key in the
// per-signal score maps persisted to the cache.
impl Serialize for SignalKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SignalKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KindVisitor;

        impl Visitor<'_> for KindVisitor {
            type Value = SignalKind;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a signal kind string")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<SignalKind, E> {
                value.parse().map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_str(KindVisitor)
    }
}

/// One candidate's blended score with per-signal diagnostics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedScore {
    pub item_id: ItemId,
    /// Weighted blend after the agreement bonus
    pub score: f32,
    /// Normalized per-signal contributions, for diagnostics and explanation
    pub per_signal: HashMap<SignalKind, f32>,
    /// Number of signals that scored this candidate above zero
    pub methods_matched: u32,
}

/// Final response entry, annotated with both the blend score and the score
/// after the diversity rerank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankedItem {
    pub item_id: ItemId,
    pub original_score: f32,
    pub reranked_score: f32,
    pub per_signal: HashMap<SignalKind, f32>,
    pub methods_matched: u32,
    #[serde(default)]
    pub reasons: Vec<String>,
}
