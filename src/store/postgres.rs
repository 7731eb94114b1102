use std::collections::{HashMap, HashSet};

use sqlx::types::Json;
use sqlx::PgPool;

use super::{CandidateStore, PmiNeighbor};
use crate::{
    error::AppResult,
    models::{
        Candidate, EntityAssociations, ItemId, ProducerAssociation, Rating, RecommendFilters,
        SparseVector, SpoilerLevel, StaffAssociation, TagAssociation, TraitAssociation, UserId,
    },
};

/// Postgres-backed candidate store
///
/// Reads the serving tables maintained by the offline jobs:
/// `user_votes`, `items`, `item_tag_vectors`, `item_latent_factors`,
/// `item_pmi_neighbors`, `item_similarity_neighbors`, and the entity
/// association tables (`item_tags`, `item_traits`, `item_staff`,
/// `item_seiyuu`, `item_producers`).
#[derive(Clone)]
pub struct PgCandidateStore {
    pool: PgPool,
}

impl PgCandidateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn spoiler_from_i16(value: i16) -> SpoilerLevel {
    match value {
        2 => SpoilerLevel::Major,
        1 => SpoilerLevel::Minor,
        _ => SpoilerLevel::None,
    }
}

#[async_trait::async_trait]
impl CandidateStore for PgCandidateStore {
    async fn get_user_ratings(&self, user_id: UserId) -> AppResult<Vec<Rating>> {
        let rows: Vec<(i64, i16)> = sqlx::query_as(
            "SELECT item_id, vote FROM user_votes WHERE user_id = $1 ORDER BY added_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(item_id, vote)| Rating {
                item_id,
                vote: vote.clamp(10, 100) as u8,
            })
            .collect())
    }

    async fn get_content_vector(&self, item_id: ItemId) -> AppResult<Option<SparseVector>> {
        let row: Option<(Json<Vec<(u32, f32)>>,)> =
            sqlx::query_as("SELECT vector FROM item_tag_vectors WHERE item_id = $1")
                .bind(item_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(Json(pairs),)| SparseVector::from_pairs(pairs)))
    }

    async fn get_latent_factor(&self, item_id: ItemId) -> AppResult<Option<Vec<f32>>> {
        let row: Option<(Json<Vec<f32>>,)> =
            sqlx::query_as("SELECT factor FROM item_latent_factors WHERE item_id = $1")
                .bind(item_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(Json(factor),)| factor))
    }

    async fn get_pmi_neighbors(&self, item_id: ItemId) -> AppResult<Vec<PmiNeighbor>> {
        let rows: Vec<(i64, f32, i32)> = sqlx::query_as(
            "SELECT neighbor_id, pmi, co_raters \
             FROM item_pmi_neighbors WHERE item_id = $1 ORDER BY pmi DESC",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(neighbor_id, pmi, co_raters)| PmiNeighbor {
                neighbor_id,
                pmi,
                co_raters: co_raters.max(0) as u32,
            })
            .collect())
    }

    async fn get_precomputed_neighbors(&self, item_id: ItemId) -> AppResult<Vec<(ItemId, f32)>> {
        let rows: Vec<(i64, f32)> = sqlx::query_as(
            "SELECT neighbor_id, similarity \
             FROM item_similarity_neighbors WHERE item_id = $1 ORDER BY rank",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn get_entity_associations(
        &self,
        item_id: ItemId,
        spoiler_level: SpoilerLevel,
    ) -> AppResult<EntityAssociations> {
        let mut associations = load_associations(
            &self.pool,
            &[item_id],
            spoiler_level,
        )
        .await?;

        Ok(associations.remove(&item_id).unwrap_or_default())
    }

    async fn list_candidates(
        &self,
        excluded: &HashSet<ItemId>,
        filters: &RecommendFilters,
        cap: usize,
    ) -> AppResult<Vec<Candidate>> {
        let excluded_ids: Vec<i64> = excluded.iter().copied().collect();
        let length_range = filters.length_range;

        let rows: Vec<(i64, Option<i32>, i32, Option<f32>, Option<i16>)> = sqlx::query_as(
            "SELECT id, release_year, popularity, rating, length FROM items \
             WHERE id <> ALL($1) \
               AND ($2::real IS NULL OR rating >= $2) \
               AND ($3::smallint IS NULL OR length BETWEEN $3 AND $4) \
             ORDER BY popularity DESC LIMIT $5",
        )
        .bind(&excluded_ids)
        .bind(filters.min_rating)
        .bind(length_range.map(|r| r.min as i16))
        .bind(length_range.map(|r| r.max as i16))
        .bind(cap as i64)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.0).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = load_content_vectors(&self.pool, &ids).await?;
        let mut factors = load_latent_factors(&self.pool, &ids).await?;
        let mut associations = load_associations(&self.pool, &ids, filters.spoiler_level).await?;

        let mut candidates = Vec::with_capacity(rows.len());
        for (id, release_year, popularity, rating, length) in rows {
            let entities = associations.remove(&id).unwrap_or_default();
            let developers: HashSet<i64> = entities
                .producers
                .iter()
                .filter(|p| p.developer)
                .map(|p| p.producer_id)
                .collect();

            let candidate = Candidate {
                id,
                content_vector: vectors.remove(&id).unwrap_or_default(),
                latent_factor: factors.remove(&id).unwrap_or_default(),
                developers,
                release_year,
                popularity: popularity.max(0) as u32,
                rating,
                length: length.map(|l| l as u8),
                entities,
            };

            // Entity include/exclude lists need the loaded associations,
            // so they are applied here rather than in SQL.
            if filters.matches(&candidate) {
                candidates.push(candidate);
            }
        }

        tracing::debug!(
            pool = candidates.len(),
            excluded = excluded.len(),
            "Candidate snapshot loaded"
        );

        Ok(candidates)
    }
}

async fn load_content_vectors(
    pool: &PgPool,
    ids: &[i64],
) -> AppResult<HashMap<ItemId, SparseVector>> {
    let rows: Vec<(i64, Json<Vec<(u32, f32)>>)> =
        sqlx::query_as("SELECT item_id, vector FROM item_tag_vectors WHERE item_id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await?;

    Ok(rows
        .into_iter()
        .map(|(id, Json(pairs))| (id, SparseVector::from_pairs(pairs)))
        .collect())
}

async fn load_latent_factors(pool: &PgPool, ids: &[i64]) -> AppResult<HashMap<ItemId, Vec<f32>>> {
    let rows: Vec<(i64, Json<Vec<f32>>)> =
        sqlx::query_as("SELECT item_id, factor FROM item_latent_factors WHERE item_id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().map(|(id, Json(f))| (id, f)).collect())
}

async fn load_associations(
    pool: &PgPool,
    ids: &[i64],
    spoiler_level: SpoilerLevel,
) -> AppResult<HashMap<ItemId, EntityAssociations>> {
    let mut result: HashMap<ItemId, EntityAssociations> = HashMap::new();
    let max_spoiler = spoiler_level.as_u8() as i16;

    let tags: Vec<(i64, i64, f32, i16, bool)> = sqlx::query_as(
        "SELECT item_id, tag_id, score, spoiler, sexual \
         FROM item_tags WHERE item_id = ANY($1) AND spoiler <= $2",
    )
    .bind(ids)
    .bind(max_spoiler)
    .fetch_all(pool)
    .await?;
    for (item_id, tag_id, score, spoiler, sexual) in tags {
        result.entry(item_id).or_default().tags.push(TagAssociation {
            tag_id,
            score,
            spoiler: spoiler_from_i16(spoiler),
            sexual,
        });
    }

    let traits: Vec<(i64, i64, i16)> = sqlx::query_as(
        "SELECT item_id, trait_id, spoiler \
         FROM item_traits WHERE item_id = ANY($1) AND spoiler <= $2",
    )
    .bind(ids)
    .bind(max_spoiler)
    .fetch_all(pool)
    .await?;
    for (item_id, trait_id, spoiler) in traits {
        result
            .entry(item_id)
            .or_default()
            .traits
            .push(TraitAssociation {
                trait_id,
                spoiler: spoiler_from_i16(spoiler),
            });
    }

    let staff: Vec<(i64, i64, String)> =
        sqlx::query_as("SELECT item_id, staff_id, role FROM item_staff WHERE item_id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await?;
    for (item_id, staff_id, role) in staff {
        result
            .entry(item_id)
            .or_default()
            .staff
            .push(StaffAssociation { staff_id, role });
    }

    let seiyuu: Vec<(i64, i64)> =
        sqlx::query_as("SELECT item_id, staff_id FROM item_seiyuu WHERE item_id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await?;
    for (item_id, staff_id) in seiyuu {
        result.entry(item_id).or_default().seiyuu.push(staff_id);
    }

    let producers: Vec<(i64, i64, bool, bool)> = sqlx::query_as(
        "SELECT item_id, producer_id, developer, publisher \
         FROM item_producers WHERE item_id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;
    for (item_id, producer_id, developer, publisher) in producers {
        result
            .entry(item_id)
            .or_default()
            .producers
            .push(ProducerAssociation {
                producer_id,
                developer,
                publisher,
            });
    }

    Ok(result)
}
