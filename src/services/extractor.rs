use std::collections::HashMap;

use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::{EntityAffinityMap, EntityKind, EntityRef, UserId};

/// Source of per-user entity affinity weights
///
/// The affinity map feeds the entity-affinity signals and the explanation
/// generator. An empty map is a valid answer for users the analytics side
/// has never seen.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PreferenceExtractor: Send + Sync {
    async fn extract(&self, user_id: UserId) -> AppResult<EntityAffinityMap>;
}

/// Wire format of the analytics service's affinity endpoint
#[derive(Debug, Deserialize)]
struct AffinityResponse {
    affinities: Vec<AffinityEntry>,
}

#[derive(Debug, Deserialize)]
struct AffinityEntry {
    kind: EntityKind,
    id: i64,
    weight: f32,
}

/// Preference extractor backed by the external analytics HTTP service
#[derive(Clone)]
pub struct HttpPreferenceExtractor {
    http_client: HttpClient,
    base_url: String,
}

impl HttpPreferenceExtractor {
    pub fn new(base_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url,
        }
    }
}

#[async_trait::async_trait]
impl PreferenceExtractor for HttpPreferenceExtractor {
    async fn extract(&self, user_id: UserId) -> AppResult<EntityAffinityMap> {
        let url = format!("{}/v1/users/{}/affinities", self.base_url, user_id);

        let response = self.http_client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(user_id, "No affinity profile for user");
            return Ok(EntityAffinityMap::default());
        }
        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "Affinity service returned {}",
                response.status()
            )));
        }

        let body: AffinityResponse = response.json().await?;

        let mut weights: HashMap<EntityRef, f32> = HashMap::with_capacity(body.affinities.len());
        for entry in body.affinities {
            weights.insert(EntityRef::new(entry.kind, entry.id), entry.weight);
        }

        tracing::debug!(
            user_id,
            entity_count = weights.len(),
            "Extracted affinity profile"
        );
        Ok(EntityAffinityMap::new(weights))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affinity_response_parses_all_kinds() {
        let json = r#"{
            "affinities": [
                {"kind": "tag", "id": 32, "weight": 0.8},
                {"kind": "trait", "id": 5, "weight": -0.2},
                {"kind": "staff", "id": 901, "weight": 0.5},
                {"kind": "seiyuu", "id": 14, "weight": 0.3},
                {"kind": "producer", "id": 7, "weight": 0.9}
            ]
        }"#;
        let parsed: AffinityResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.affinities.len(), 5);
        assert_eq!(parsed.affinities[0].kind, EntityKind::Tag);
        assert_eq!(parsed.affinities[4].kind, EntityKind::Producer);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_error() {
        // The engine decides whether to degrade; the extractor itself
        // must surface the failure.
        let extractor = HttpPreferenceExtractor::new("http://127.0.0.1:1".to_string());
        assert!(extractor.extract(1).await.is_err());
    }
}
