use std::collections::HashSet;

use crate::{
    error::AppResult,
    models::{
        Candidate, EntityAssociations, ItemId, Rating, RecommendFilters, SparseVector,
        SpoilerLevel, UserId,
    },
};

pub mod postgres;

pub use postgres::PgCandidateStore;

/// One row of the offline item-item co-occurrence table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PmiNeighbor {
    pub neighbor_id: ItemId,
    /// Pointwise mutual information of the pair, log2 scale
    pub pmi: f32,
    /// Number of users that rated both items
    pub co_raters: u32,
}

/// Read-only access to catalog metadata and offline model artifacts
///
/// Implementations serve eventually-consistent snapshots produced by the
/// batch training jobs; the serving path never writes through this trait.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CandidateStore: Send + Sync {
    /// Rating history for a user, oldest vote first. Empty means the user
    /// is unknown or has no votes; callers decide which of those is fatal.
    async fn get_user_ratings(&self, user_id: UserId) -> AppResult<Vec<Rating>>;

    /// IDF-weighted, L2-normalized tag vector of an item
    async fn get_content_vector(&self, item_id: ItemId) -> AppResult<Option<SparseVector>>;

    /// Latent factor from the last offline factorization run
    async fn get_latent_factor(&self, item_id: ItemId) -> AppResult<Option<Vec<f32>>>;

    /// Co-occurrence neighbors of an item, strongest PMI first
    async fn get_pmi_neighbors(&self, item_id: ItemId) -> AppResult<Vec<PmiNeighbor>>;

    /// Daily-refreshed content-similarity nearest neighbors
    async fn get_precomputed_neighbors(&self, item_id: ItemId) -> AppResult<Vec<(ItemId, f32)>>;

    /// Entity associations visible at the given spoiler level
    async fn get_entity_associations(
        &self,
        item_id: ItemId,
        spoiler_level: SpoilerLevel,
    ) -> AppResult<EntityAssociations>;

    /// Candidate snapshot pool: unexcluded items passing the hard filters,
    /// most popular first, at most `cap` entries
    async fn list_candidates(
        &self,
        excluded: &HashSet<ItemId>,
        filters: &RecommendFilters,
        cap: usize,
    ) -> AppResult<Vec<Candidate>>;
}
