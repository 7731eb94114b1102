use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{EntityRef, ItemId, LengthRange, RecommendFilters, RerankedItem, SpoilerLevel, UserId},
    routes::AppState,
};

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub user_id: UserId,
    #[serde(default)]
    pub exclude_ids: Vec<ItemId>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub min_rating: Option<f32>,
    #[serde(default)]
    pub length_range: Option<LengthRange>,
    #[serde(default)]
    pub include_entities: Vec<EntityRef>,
    #[serde(default)]
    pub exclude_entities: Vec<EntityRef>,
    #[serde(default)]
    pub spoiler_level: SpoilerLevel,
    #[serde(default)]
    pub skip_cache: bool,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub items: Vec<ResponseItem>,
    pub cache_hit: bool,
}

#[derive(Debug, Serialize)]
pub struct ResponseItem {
    pub item_id: ItemId,
    pub score: f32,
    pub original_score: f32,
    pub per_signal_scores: std::collections::HashMap<crate::models::SignalKind, f32>,
    pub methods_matched: u32,
    pub reasons: Vec<String>,
}

impl From<RerankedItem> for ResponseItem {
    fn from(item: RerankedItem) -> Self {
        Self {
            item_id: item.item_id,
            score: item.reranked_score,
            original_score: item.original_score,
            per_signal_scores: item.per_signal,
            methods_matched: item.methods_matched,
            reasons: item.reasons,
        }
    }
}

/// Handler for the recommendations endpoint
pub async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    if request.limit == 0 || request.limit > MAX_LIMIT {
        return Err(AppError::InvalidInput(format!(
            "limit must be between 1 and {MAX_LIMIT}"
        )));
    }

    let filters = RecommendFilters {
        min_rating: request.min_rating,
        length_range: request.length_range,
        include_entities: request.include_entities,
        exclude_entities: request.exclude_entities,
        spoiler_level: request.spoiler_level,
        skip_cache: request.skip_cache,
    };

    let recommendations = state
        .engine
        .recommend(request.user_id, &request.exclude_ids, request.limit, &filters)
        .await?;

    let cache_hit = recommendations.cache_hit();
    Ok(Json(RecommendationResponse {
        items: recommendations.items.into_iter().map(Into::into).collect(),
        cache_hit,
    }))
}
