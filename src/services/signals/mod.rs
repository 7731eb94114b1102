use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::{
    error::AppError,
    models::{Candidate, EntityKind, ItemId, SignalKind, SpoilerLevel, UserProfile},
    store::CandidateStore,
};

pub mod affinity;
pub mod collaborative;
pub mod content;
pub mod cooccurrence;
pub mod precomputed;

pub use affinity::AffinitySignal;
pub use collaborative::CollaborativeSignal;
pub use content::ContentSignal;
pub use cooccurrence::CooccurrenceSignal;
pub use precomputed::PrecomputedSignal;

/// Failure inside one scoring strategy
///
/// Distinct from "legitimately found nothing": the engine logs these and
/// treats the signal as empty, so tests can tell the two apart while the
/// blend behaves identically.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("store access failed: {0}")]
    Store(#[from] AppError),
}

/// Scored candidates from one signal, strongest first
pub type SignalScores = Vec<(ItemId, f32)>;

/// Shared per-request view the signals score against
///
/// Everything here is an immutable snapshot; signals are pure functions of
/// (profile, context) and never touch shared mutable state.
pub struct SignalContext {
    pub candidates: Arc<Vec<Candidate>>,
    candidate_ids: HashSet<ItemId>,
    pub store: Arc<dyn CandidateStore>,
    pub spoiler_level: SpoilerLevel,
    /// Per-signal output truncation; kept larger than the response limit so
    /// the reranker has room to diversify
    pub pool_size: usize,
    /// Co-occurrence pairs with fewer co-raters than this never score
    pub min_co_raters: u32,
}

impl SignalContext {
    pub fn new(
        candidates: Arc<Vec<Candidate>>,
        store: Arc<dyn CandidateStore>,
        spoiler_level: SpoilerLevel,
        pool_size: usize,
        min_co_raters: u32,
    ) -> Self {
        let candidate_ids = candidates.iter().map(|c| c.id).collect();
        Self {
            candidates,
            candidate_ids,
            store,
            spoiler_level,
            pool_size,
            min_co_raters,
        }
    }

    pub fn is_candidate(&self, item_id: ItemId) -> bool {
        self.candidate_ids.contains(&item_id)
    }
}

/// One independent scoring strategy
#[async_trait::async_trait]
pub trait Signal: Send + Sync {
    fn kind(&self) -> SignalKind;

    /// Scores candidates for the profile, sorted descending and truncated
    /// to the context pool size. An `Err` is caught at the fan-in point and
    /// converted to an empty list; it never aborts the request.
    async fn recommend(
        &self,
        profile: &UserProfile,
        ctx: &SignalContext,
    ) -> Result<SignalScores, SignalError>;
}

/// The full signal roster: four item-level strategies plus one affinity
/// instance per entity kind
pub fn all_signals() -> Vec<Box<dyn Signal>> {
    let mut signals: Vec<Box<dyn Signal>> = vec![
        Box::new(ContentSignal),
        Box::new(CollaborativeSignal),
        Box::new(CooccurrenceSignal),
        Box::new(PrecomputedSignal),
    ];
    signals.extend(
        EntityKind::ALL
            .iter()
            .map(|&kind| Box::new(AffinitySignal::new(kind)) as Box<dyn Signal>),
    );
    signals
}

/// Sorts a score map descending and truncates to the pool size
pub(crate) fn into_ranked(scores: HashMap<ItemId, f32>, pool_size: usize) -> SignalScores {
    let mut ranked: Vec<(ItemId, f32)> = scores.into_iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(pool_size);
    ranked
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_covers_all_kinds() {
        let kinds: Vec<SignalKind> = all_signals().iter().map(|s| s.kind()).collect();
        assert_eq!(kinds.len(), SignalKind::COUNT);
        for kind in SignalKind::all() {
            assert!(kinds.contains(&kind), "missing signal {kind}");
        }
    }

    #[test]
    fn test_into_ranked_sorts_and_truncates() {
        let scores = HashMap::from([(1, 0.2), (2, 0.9), (3, 0.5)]);
        let ranked = into_ranked(scores, 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].0, 2);
        assert_eq!(ranked[1].0, 3);
    }
}
